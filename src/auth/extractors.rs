use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::Response,
};
use tracing::{debug, warn};

use super::{
    claims::Claims,
    cookies::{is_htmx, read_token, redirect, removal_cookie, AuthRedirect, HOME_PATH},
};
use crate::state::AppState;

/// Claims of the caller, verified from the session cookie.
///
/// Verification is signature and expiry only; the user store is not consulted.
pub struct CurrentUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookie_cfg = &state.config.cookie;
        let htmx = is_htmx(&parts.headers);

        let Some(token) = read_token(&parts.headers, &cookie_cfg.name) else {
            debug!("no session cookie");
            return Err(AuthRedirect {
                htmx,
                removal: None,
            });
        };

        match state.auth.verify_token(&token) {
            Ok(claims) => Ok(CurrentUser(claims)),
            Err(e) => {
                warn!(reason = %e, "session token rejected; clearing cookie");
                Err(AuthRedirect {
                    htmx,
                    removal: Some(removal_cookie(cookie_cfg)),
                })
            }
        }
    }
}

/// Admits only callers without a session cookie. Anyone already holding one
/// is sent to the home page; the cookie is not verified here, `/me` takes care
/// of clearing a stale one.
#[derive(Debug)]
pub struct RequireGuest;

#[async_trait]
impl FromRequestParts<AppState> for RequireGuest {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if read_token(&parts.headers, &state.config.cookie.name).is_some() {
            debug!("session cookie present on guest route");
            return Err(redirect(is_htmx(&parts.headers), HOME_PATH, None));
        }
        Ok(RequireGuest)
    }
}
