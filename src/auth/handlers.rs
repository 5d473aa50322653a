use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        claims::Claims,
        cookies::{
            is_htmx, read_token, redirect, removal_cookie, session_cookie, HOME_PATH,
            LOGIN_PATH, REGISTERED_PATH,
        },
        dto::{ErrorResponse, FormErrorBody, FormProblem, LoginForm, PublicUser, RegisterForm},
        error::AuthError,
        extractors::{CurrentUser, RequireGuest},
        services::Registration,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me/account", get(get_account))
}

fn form_error(problem: FormProblem, email: String, name: Option<String>) -> Response {
    (
        problem.status(),
        Json(FormErrorBody {
            error: problem.message(),
            email,
            name,
        }),
    )
        .into_response()
}

/// Entry point: signed-in callers go home, everyone else to the login page.
pub async fn root(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let to = match read_token(&headers, &state.config.cookie.name) {
        Some(_) => HOME_PATH,
        None => LOGIN_PATH,
    };
    redirect(is_htmx(&headers), to, None)
}

#[instrument(skip(state, headers, form))]
pub async fn register(
    State(state): State<AppState>,
    _guest: RequireGuest,
    headers: HeaderMap,
    Form(mut form): Form<RegisterForm>,
) -> Response {
    form.normalize();

    if let Err(problem) = form.validate() {
        warn!(email = %form.email, ?problem, "registration rejected");
        return form_error(problem, form.email, Some(form.name));
    }

    let input = Registration {
        email: form.email.clone(),
        password: form.password,
        name: form.name.clone(),
    };

    match state.auth.register(input).await {
        Ok(_) => redirect(is_htmx(&headers), REGISTERED_PATH, None),
        Err(AuthError::DuplicateEmail) => {
            form_error(FormProblem::EmailTaken, form.email, Some(form.name))
        }
        Err(e) => {
            error!(error = %e, "register failed");
            form_error(FormProblem::Unexpected, form.email, Some(form.name))
        }
    }
}

#[instrument(skip(state, headers, form))]
pub async fn login(
    State(state): State<AppState>,
    _guest: RequireGuest,
    headers: HeaderMap,
    Form(mut form): Form<LoginForm>,
) -> Response {
    form.normalize();

    if form.email.is_empty() || form.password.is_empty() {
        return form_error(FormProblem::MissingFields, form.email, None);
    }

    match state.auth.login(&form.email, &form.password).await {
        Ok((_user, token)) => {
            let cookie = session_cookie(&state.config.cookie, &token, state.auth.tokens().ttl());
            redirect(is_htmx(&headers), HOME_PATH, Some(cookie))
        }
        Err(AuthError::InvalidCredentials) => {
            form_error(FormProblem::InvalidCredentials, form.email, None)
        }
        Err(e) => {
            error!(error = %e, "login failed");
            form_error(FormProblem::Unexpected, form.email, None)
        }
    }
}

#[instrument(skip(state, headers, user), fields(user_id = user.0.user_id))]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap, user: CurrentUser) -> Response {
    info!("user logged out");
    redirect(
        is_htmx(&headers),
        LOGIN_PATH,
        Some(removal_cookie(&state.config.cookie)),
    )
}

pub async fn get_me(CurrentUser(claims): CurrentUser) -> Json<Claims> {
    Json(claims)
}

#[instrument(skip(state, claims), fields(user_id = claims.user_id))]
pub async fn get_account(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<PublicUser>, (StatusCode, Json<ErrorResponse>)> {
    match state.auth.user_by_id(claims.user_id).await {
        Ok(user) => Ok(Json(user.into())),
        Err(AuthError::NotFound) => {
            warn!("account no longer exists");
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "User not found".into(),
                }),
            ))
        }
        Err(e) => {
            error!(error = %e, "user lookup failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal server error".into(),
                }),
            ))
        }
    }
}
