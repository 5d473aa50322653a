use axum::{
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Redirect, Response},
};
use cookie::{Cookie, SameSite};
use time::Duration;

use crate::config::CookieConfig;

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTERED_PATH: &str = "/auth/login?registered=true";
pub const HOME_PATH: &str = "/me";

const HX_REQUEST: &str = "hx-request";
const HX_REDIRECT: &str = "hx-redirect";

/// HTTP-only cookie carrying the session token; lives as long as the token.
pub fn session_cookie(cfg: &CookieConfig, token: &str, ttl: Duration) -> String {
    Cookie::build((cfg.name.clone(), token.to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cfg.secure)
        .max_age(ttl)
        .build()
        .to_string()
}

pub fn removal_cookie(cfg: &CookieConfig) -> String {
    let mut c = Cookie::build((cfg.name.clone(), String::new()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cfg.secure)
        .build();
    c.make_removal();
    c.to_string()
}

pub fn read_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|part| Cookie::parse(part.trim()).ok())
        .find(|c| c.name() == cookie_name && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get(HX_REQUEST)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "true")
        .unwrap_or(false)
}

fn append_cookie(res: &mut Response, cookie: Option<String>) {
    if let Some(c) = cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
        res.headers_mut().append(SET_COOKIE, c);
    }
}

/// Redirect after a successful form post. htmx clients get `HX-Redirect`
/// with 200 instead of a 3xx.
pub fn redirect(htmx: bool, to: &str, cookie: Option<String>) -> Response {
    let mut res = if htmx {
        (StatusCode::OK, [(HX_REDIRECT, to)]).into_response()
    } else {
        Redirect::to(to).into_response()
    };
    append_cookie(&mut res, cookie);
    res
}

/// Bounce to the login page when no usable session is present, clearing the
/// stored token if it was rejected.
pub struct AuthRedirect {
    pub htmx: bool,
    pub removal: Option<String>,
}

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        let mut res = if self.htmx {
            (StatusCode::UNAUTHORIZED, [(HX_REDIRECT, LOGIN_PATH)]).into_response()
        } else {
            Redirect::to(LOGIN_PATH).into_response()
        };
        append_cookie(&mut res, self.removal);
        res
    }
}
