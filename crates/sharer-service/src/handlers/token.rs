//! Public token endpoint.
//!
//! Lets an external page join the running sharer session (or start one)
//! with only an identity. Disabled unless `ENABLE_TOKEN_ENDPOINT=true`.

use crate::errors::ApiError;
use crate::models::{JoinSessionResponse, ParticipantRole};
use crate::routes::AppState;
use crate::services::session_policy::ResolutionMode;
use crate::services::token_policy;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub identity: Option<String>,
}

/// `GET /api/token?identity=...`
#[instrument(skip_all, name = "sharer.handlers.public_token")]
pub async fn public_token(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<JoinSessionResponse>, ApiError> {
    if !state.config.enable_token_endpoint {
        return Err(ApiError::TokenEndpointDisabled);
    }

    let identity = query
        .identity
        .filter(|identity| !identity.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("No identity provided".to_string()))?;

    let session = state
        .session_resolver
        .resolve(
            &state.settings,
            state.directory.as_ref(),
            ResolutionMode::ReuseOrCreate,
        )
        .await?;

    let token = token_policy::issue_token(
        state.directory.as_ref(),
        &session,
        &identity,
        ParticipantRole::Presenter,
    )
    .await?;

    Ok(Json(JoinSessionResponse::new(token, session)))
}
