//! Recording lookup.

use crate::errors::PolicyError;
use crate::models::RecordingListing;
use crate::services::directory::SessionDirectory;
use tracing::{instrument, warn};

/// Session detail, its egress records and the bucket holding the media.
///
/// Session and egress lookups must both succeed. The bucket name is
/// best-effort: if project details are unavailable it is left empty.
///
/// # Errors
///
/// `NotFound` or `UpstreamFailure` if the session or its egresses cannot be
/// fetched.
#[instrument(skip(directory))]
pub async fn list_recordings(
    directory: &dyn SessionDirectory,
    session_id: &str,
) -> Result<RecordingListing, PolicyError> {
    let s3_bucket_name = match directory.get_project_details().await {
        Ok(project) => project.bucket_name,
        Err(e) => {
            warn!(
                target: "sharer.services.recordings",
                error = %e,
                "Project details unavailable, bucket name left empty"
            );
            String::new()
        }
    };

    let session = directory.get_session(session_id).await?;
    let recordings = directory.list_egresses(session_id).await?;

    Ok(RecordingListing {
        s3_bucket_name,
        session,
        recordings,
    })
}

/// Playable URL for a recorded object. Not retried.
///
/// # Errors
///
/// `InvalidRequest` for an empty path, otherwise provider failures.
#[instrument(skip(directory))]
pub async fn resolve_media_url(
    directory: &dyn SessionDirectory,
    session_id: &str,
    path: &str,
) -> Result<String, PolicyError> {
    if path.is_empty() {
        return Err(PolicyError::InvalidRequest {
            reason: "media path is required".to_string(),
        });
    }

    Ok(directory.get_media_url(session_id, path).await?)
}
