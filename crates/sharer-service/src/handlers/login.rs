//! Admin login and logout.

use crate::auth::{verify_credentials, SESSION_COOKIE};
use crate::errors::ApiError;
use crate::models::LoginResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Form, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// `POST /api/login`
///
/// On success sets an HttpOnly `sessionId` cookie valid for the configured
/// admin session lifetime.
#[instrument(skip_all, name = "sharer.handlers.login")]
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let valid = verify_credentials(
        &state.config.root_user,
        &state.config.root_password_hash,
        &form.username,
        &form.password,
    )?;

    if !valid {
        warn!(target: "sharer.handlers.login", "Rejected admin login");
        return Err(ApiError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let session_id = state.admin_sessions.create();
    let max_age = i64::try_from(state.admin_sessions.ttl().as_secs()).unwrap_or(i64::MAX);
    let cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(max_age));

    info!(target: "sharer.handlers.login", "Admin logged in");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            user: state.config.root_user.clone(),
        }),
    ))
}

/// `POST /api/logout`
///
/// Revokes the login session (if any) and clears the cookie.
#[instrument(skip_all, name = "sharer.handlers.logout")]
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.admin_sessions.revoke(cookie.value());
    }

    (
        jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/")),
        StatusCode::NO_CONTENT,
    )
}
