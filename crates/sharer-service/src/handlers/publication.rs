//! Publication record handler.

use crate::models::PublicationRecord;
use crate::routes::AppState;
use crate::services::publication::store_publication_record;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// `POST /api/publication-records`
///
/// Stores the record best-effort and always echoes it back.
#[instrument(skip_all, name = "sharer.handlers.publication_record")]
pub async fn publication_record(
    State(state): State<Arc<AppState>>,
    Json(record): Json<PublicationRecord>,
) -> Json<PublicationRecord> {
    store_publication_record(
        state.directory.as_ref(),
        state.object_store.as_ref(),
        &record,
    )
    .await;

    Json(record)
}
