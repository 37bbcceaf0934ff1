//! Admin cookie gate for protected routes.

use crate::auth::SESSION_COOKIE;
use crate::errors::ApiError;
use crate::routes::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::instrument;

/// Require a live admin login session.
///
/// # Response
///
/// - Returns 401 Unauthorized if the `sessionId` cookie is missing or unknown
/// - Continues to the next handler otherwise
#[instrument(skip_all, name = "sharer.middleware.auth")]
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = jar.get(SESSION_COOKIE).map(|c| c.value()).ok_or_else(|| {
        tracing::debug!(target: "sharer.middleware.auth", "Missing admin session cookie");
        ApiError::Unauthorized("Login required".to_string())
    })?;

    if !state.admin_sessions.is_valid(session_id) {
        tracing::debug!(target: "sharer.middleware.auth", "Unknown or expired admin session");
        return Err(ApiError::Unauthorized("Login required".to_string()));
    }

    Ok(next.run(req).await)
}
