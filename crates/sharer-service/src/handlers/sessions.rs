//! Session listing and in-session token handlers.

use crate::errors::{ApiError, PolicyError};
use crate::models::{JoinSessionResponse, ParticipantRole, SessionsOverview};
use crate::routes::AppState;
use crate::services::token_policy;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct JoinSessionRequest {
    pub identity: String,
}

/// `GET /api/sessions`
///
/// Every provider session of the project, sharer-created or not.
#[instrument(skip_all, name = "sharer.handlers.list_sessions")]
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionsOverview>, ApiError> {
    let sessions = state
        .directory
        .list_sessions()
        .await
        .map_err(PolicyError::from)?;

    Ok(Json(SessionsOverview {
        sessions,
        settings: state.settings.get(),
    }))
}

/// `POST /api/sessions/:id/token`
///
/// Admin-role token for the given identity.
#[instrument(skip_all, name = "sharer.handlers.join_session")]
pub async fn join_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<JoinSessionRequest>,
) -> Result<Json<JoinSessionResponse>, ApiError> {
    let session = state
        .directory
        .get_session(&session_id)
        .await
        .map_err(PolicyError::from)?;

    let token = token_policy::issue_token(
        state.directory.as_ref(),
        &session,
        &request.identity,
        ParticipantRole::Admin,
    )
    .await?;

    Ok(Json(JoinSessionResponse::new(token, session)))
}

/// `GET /api/preview/:id`
///
/// Hidden, subscribe-only token for the admin user. The session must be
/// running.
#[instrument(skip_all, name = "sharer.handlers.preview")]
pub async fn preview_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<JoinSessionResponse>, ApiError> {
    let (session, token) = token_policy::issue_viewer_token(
        state.directory.as_ref(),
        &session_id,
        &state.config.root_user,
    )
    .await?;

    Ok(Json(JoinSessionResponse::new(token, session)))
}
