//! Recording handlers.

use crate::errors::ApiError;
use crate::models::{MediaUrl, RecordingListing};
use crate::routes::AppState;
use crate::services::recordings;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct MediaUrlQuery {
    #[serde(default)]
    pub path: String,
}

/// `GET /api/recordings/:id`
#[instrument(skip_all, name = "sharer.handlers.list_recordings")]
pub async fn list_recordings(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<RecordingListing>, ApiError> {
    let listing = recordings::list_recordings(state.directory.as_ref(), &session_id).await?;
    Ok(Json(listing))
}

/// `GET /api/recordings/:id/media-url?path=...`
#[instrument(skip_all, name = "sharer.handlers.media_url")]
pub async fn media_url(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(query): Query<MediaUrlQuery>,
) -> Result<Json<MediaUrl>, ApiError> {
    let url =
        recordings::resolve_media_url(state.directory.as_ref(), &session_id, &query.path).await?;
    Ok(Json(MediaUrl { url }))
}
