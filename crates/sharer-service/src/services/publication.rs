//! Publication records.
//!
//! Participants' clients report publication events; the sharer stores each
//! report as a JSON object in the project bucket. Storage is best-effort and
//! never fails the request.

use crate::models::{ProjectDetails, PublicationRecord};
use crate::observability::metrics::record_publication;
use crate::services::directory::SessionDirectory;
use crate::services::object_store::ObjectStore;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, instrument, warn};

const RECORD_CONTENT_TYPE: &str = "application/json";

/// Object key of a publication record.
///
/// `{project.name}-{project.id}/{session}/publication-records/{identity}/{timestamp}/record.json`
pub fn record_path(project: &ProjectDetails, record: &PublicationRecord, at: DateTime<Utc>) -> String {
    format!(
        "{}-{}/{}/publication-records/{}/{}/record.json",
        project.name,
        project.id,
        record.session_name,
        record.identity,
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Store `record` in the project bucket. Failures are logged only.
#[instrument(skip_all, fields(session_name = %record.session_name, identity = %record.identity))]
pub async fn store_publication_record(
    directory: &dyn SessionDirectory,
    store: &dyn ObjectStore,
    record: &PublicationRecord,
) {
    let project = match directory.get_project_details().await {
        Ok(project) => project,
        Err(e) => {
            warn!(
                target: "sharer.services.publication",
                error = %e,
                "Project details unavailable, publication record not stored"
            );
            record_publication("skipped");
            return;
        }
    };

    let body = match serde_json::to_vec(record) {
        Ok(body) => body,
        Err(e) => {
            warn!(target: "sharer.services.publication", error = %e, "Failed to encode publication record");
            record_publication("error");
            return;
        }
    };

    let key = record_path(&project, record, Utc::now());
    match store
        .put_object(&project.bucket_name, &key, body, RECORD_CONTENT_TYPE)
        .await
    {
        Ok(()) => {
            debug!(target: "sharer.services.publication", key = %key, "Publication record stored");
            record_publication("stored");
        }
        Err(e) => {
            warn!(
                target: "sharer.services.publication",
                key = %key,
                error = %e,
                "Failed to store publication record"
            );
            record_publication("error");
        }
    }
}
