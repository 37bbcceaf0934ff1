//! Token grants.
//!
//! Each participant role maps to a fixed set of permissions. The room is
//! always the session's name and the display name is the identity.

use crate::errors::PolicyError;
use crate::models::{
    ParticipantRole, PublishSource, Session, SessionToken, TokenGrant, VideoGrants,
};
use crate::observability::metrics::record_token_issued;
use crate::services::directory::{DirectoryError, SessionDirectory};
use tracing::{info, instrument, warn};

/// Permission set for `role` in `room`.
pub fn grants_for_role(role: ParticipantRole, room: &str) -> VideoGrants {
    match role {
        ParticipantRole::Admin | ParticipantRole::Presenter => VideoGrants {
            room: room.to_string(),
            room_join: true,
            room_list: true,
            room_record: true,
            room_admin: true,
            room_create: true,
            ingress_admin: true,
            hidden: false,
            recorder: true,
            can_publish: true,
            can_subscribe: true,
            can_publish_data: true,
            can_update_own_metadata: true,
            can_publish_sources: PublishSource::ALL.to_vec(),
        },
        // Hidden observer: subscribes only
        ParticipantRole::Viewer => VideoGrants {
            room: room.to_string(),
            room_join: true,
            room_list: true,
            room_record: false,
            room_admin: true,
            room_create: true,
            ingress_admin: false,
            hidden: true,
            recorder: false,
            can_publish: false,
            can_subscribe: true,
            can_publish_data: false,
            can_update_own_metadata: false,
            can_publish_sources: Vec::new(),
        },
    }
}

/// Build the full grant for one participant.
pub fn build_grant(session: &Session, identity: &str, role: ParticipantRole) -> TokenGrant {
    TokenGrant {
        identity: identity.to_string(),
        name: identity.to_string(),
        role,
        video_grants: grants_for_role(role, &session.name),
    }
}

/// Mint a token for `identity` in `session`.
///
/// # Errors
///
/// - `InvalidRequest` for an empty identity (no provider call)
/// - `SessionNotActive` for a viewer token on a session that is not running
/// - `TokenIssuanceFailed` if the provider refuses or fails
#[instrument(skip(directory, session), fields(session_id = %session.id))]
pub async fn issue_token(
    directory: &dyn SessionDirectory,
    session: &Session,
    identity: &str,
    role: ParticipantRole,
) -> Result<SessionToken, PolicyError> {
    if identity.trim().is_empty() {
        return Err(PolicyError::InvalidRequest {
            reason: "No identity provided".to_string(),
        });
    }

    if role == ParticipantRole::Viewer && !session.is_active() {
        return Err(PolicyError::SessionNotActive {
            session_id: session.id.clone(),
        });
    }

    let grant = build_grant(session, identity, role);

    match directory.generate_token(&session.id, &grant).await {
        Ok(token) => {
            record_token_issued(role, "success");
            info!(
                target: "sharer.services.token_policy",
                session_id = %session.id,
                identity = %identity,
                role = ?role,
                "Token issued"
            );
            Ok(token)
        }
        Err(e) => {
            record_token_issued(role, "error");
            warn!(
                target: "sharer.services.token_policy",
                session_id = %session.id,
                role = ?role,
                error = %e,
                "Token issuance failed"
            );
            Err(token_failure(e))
        }
    }
}

fn token_failure(err: DirectoryError) -> PolicyError {
    PolicyError::TokenIssuanceFailed {
        detail: err.to_string(),
    }
}

/// Viewer (preview) token for a session looked up by id.
///
/// # Errors
///
/// `NotFound`/`UpstreamFailure` if the session cannot be fetched, otherwise
/// as [`issue_token`].
#[instrument(skip(directory))]
pub async fn issue_viewer_token(
    directory: &dyn SessionDirectory,
    session_id: &str,
    identity: &str,
) -> Result<(Session, SessionToken), PolicyError> {
    let session = directory.get_session(session_id).await?;
    let token = issue_token(directory, &session, identity, ParticipantRole::Viewer).await?;
    Ok((session, token))
}
