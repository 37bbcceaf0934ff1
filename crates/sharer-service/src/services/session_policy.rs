//! Session resolution.
//!
//! Decides which provider session a participant joins: reuse a live
//! sharer session or create a new one, rejecting duplicate names among
//! live sessions. Only sessions carrying [`SHARER_SESSION_COMMENTS`] are
//! considered; other applications in the same project are invisible here.

use crate::config::Config;
use crate::errors::PolicyError;
use crate::models::{CreateSessionParams, Session, SessionListing, SHARER_SESSION_COMMENTS};
use crate::observability::metrics::record_session_resolution;
use crate::services::directory::SessionDirectory;
use crate::services::settings::SettingsStore;
use common::backoff::{poll_until, BackoffPolicy};
use std::cmp::Reverse;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// How [`SessionResolver::resolve`] treats a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Always create; a running session with the configured name is a
    /// collision.
    CreateNew,

    /// Join any running sharer session, creating one only if none runs.
    ReuseOrCreate,
}

impl ResolutionMode {
    fn as_str(self) -> &'static str {
        match self {
            ResolutionMode::CreateNew => "create_new",
            ResolutionMode::ReuseOrCreate => "reuse_or_create",
        }
    }
}

/// Parameters applied to every session the sharer creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionDefaults {
    pub max_participants: u32,
    pub empty_timeout: u32,

    /// Budget for waiting until a created session is readable.
    pub ready_timeout: Duration,
}

impl SessionDefaults {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_participants: config.session_max_participants,
            empty_timeout: config.session_empty_timeout,
            ready_timeout: Duration::from_millis(config.session_ready_timeout_ms),
        }
    }
}

/// Keep sharer sessions and split them into running and the rest.
///
/// Ended sessions are ordered by start time, newest first; sessions that
/// never started sort last.
pub fn partition_sessions(sessions: Vec<Session>) -> SessionListing {
    let (active, mut ended): (Vec<_>, Vec<_>) = sessions
        .into_iter()
        .filter(Session::is_sharer_session)
        .partition(Session::is_active);

    ended.sort_by_key(|s| Reverse(s.started_at));

    SessionListing { active, ended }
}

/// Sharer sessions split by liveness.
///
/// # Errors
///
/// `PolicyError::UpstreamFailure` if the provider listing fails.
#[instrument(skip_all)]
pub async fn list_sharer_sessions(
    directory: &dyn SessionDirectory,
) -> Result<SessionListing, PolicyError> {
    let sessions = directory.list_sessions().await?;
    Ok(partition_sessions(sessions))
}

/// Resolves the session a participant should join, one resolution at a
/// time.
///
/// Listing, the name check and the creation call all run under one lock, so
/// concurrent requests cannot create two sessions with the same name.
#[derive(Debug)]
pub struct SessionResolver {
    defaults: SessionDefaults,
    creation_lock: Mutex<()>,
}

impl SessionResolver {
    pub fn new(defaults: SessionDefaults) -> Self {
        Self {
            defaults,
            creation_lock: Mutex::new(()),
        }
    }

    pub fn defaults(&self) -> &SessionDefaults {
        &self.defaults
    }

    /// Resolve the session a participant should join.
    ///
    /// A sharer session counts as live while it is running or created but not
    /// yet started. On creation the settings' session name is replaced by the
    /// provider's canonical name, then the provider is polled until the new
    /// session is readable or `ready_timeout` runs out. A timeout is not an
    /// error: the created session is returned as-is.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if a session must be created and no name is configured
    /// - `SessionNameCollision` (CreateNew) if a live sharer session already
    ///   has the configured name; no creation call is made
    /// - `UpstreamFailure` / `NotFound` for provider failures
    #[instrument(skip_all, fields(mode = mode.as_str()))]
    pub async fn resolve(
        &self,
        settings: &SettingsStore,
        directory: &dyn SessionDirectory,
        mode: ResolutionMode,
    ) -> Result<Session, PolicyError> {
        let _creation = self.creation_lock.lock().await;
        let result = resolve(settings, directory, &self.defaults, mode).await;

        let outcome = match &result {
            Ok((_, Resolution::Reused)) => "reused",
            Ok((_, Resolution::Created)) => "created",
            Err(PolicyError::SessionNameCollision { .. }) => "collision",
            Err(_) => "error",
        };
        record_session_resolution(mode.as_str(), outcome);

        result.map(|(session, _)| session)
    }
}

enum Resolution {
    Reused,
    Created,
}

fn is_live(session: &Session) -> bool {
    session.is_active() || session.is_pending()
}

async fn resolve(
    settings: &SettingsStore,
    directory: &dyn SessionDirectory,
    defaults: &SessionDefaults,
    mode: ResolutionMode,
) -> Result<(Session, Resolution), PolicyError> {
    let current = settings.get();
    let configured_name = current
        .session_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let sessions: Vec<Session> = directory
        .list_sessions()
        .await?
        .into_iter()
        .filter(Session::is_sharer_session)
        .collect();

    match mode {
        ResolutionMode::ReuseOrCreate => {
            let running = sessions.iter().find(|s| s.is_active());
            let pending = configured_name
                .and_then(|name| sessions.iter().find(|s| s.is_pending() && s.name == name));

            if let Some(session) = running.or(pending) {
                debug!(
                    target: "sharer.services.session_policy",
                    session_id = %session.id,
                    status = session.status.as_str(),
                    "Reusing live session"
                );
                return Ok((session.clone(), Resolution::Reused));
            }
        }
        ResolutionMode::CreateNew => {
            let name = required_name(configured_name)?;
            if sessions.iter().any(|s| is_live(s) && s.name == name) {
                info!(
                    target: "sharer.services.session_policy",
                    name = %name,
                    "Refusing to create session, name already live"
                );
                return Err(PolicyError::SessionNameCollision {
                    name: name.to_string(),
                });
            }
        }
    }

    let params = CreateSessionParams {
        name: required_name(configured_name)?.to_string(),
        comments: SHARER_SESSION_COMMENTS.to_string(),
        auto_recording: current.record_session,
        max_participants: defaults.max_participants,
        empty_timeout: defaults.empty_timeout,
    };

    let created = directory.create_session(&params).await?;
    settings.set_session_name(&created.name);

    info!(
        target: "sharer.services.session_policy",
        session_id = %created.id,
        name = %created.name,
        auto_recording = created.auto_recording,
        "Session created"
    );

    let session = wait_until_readable(directory, created, defaults.ready_timeout).await;
    Ok((session, Resolution::Created))
}

fn required_name(name: Option<&str>) -> Result<&str, PolicyError> {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(PolicyError::InvalidRequest {
            reason: "no session name configured".to_string(),
        }),
    }
}

/// Poll the provider until a just-created session can be read back.
async fn wait_until_readable(
    directory: &dyn SessionDirectory,
    created: Session,
    timeout: Duration,
) -> Session {
    let session_id = created.id.as_str();

    let polled = poll_until(BackoffPolicy::with_timeout(timeout), || async move {
        directory.get_session(session_id).await.ok()
    })
    .await;

    match polled {
        Ok(session) => session,
        Err(elapsed) => {
            warn!(
                target: "sharer.services.session_policy",
                session_id = %session_id,
                attempts = elapsed.attempts,
                "Created session not yet visible, returning creation result"
            );
            created
        }
    }
}

/// Stop a session.
///
/// # Errors
///
/// `NotFound` or `UpstreamFailure` from the provider.
#[instrument(skip(directory))]
pub async fn end_session(
    directory: &dyn SessionDirectory,
    session_id: &str,
) -> Result<Session, PolicyError> {
    let session = directory.stop_session(session_id).await?;
    info!(target: "sharer.services.session_policy", session_id = %session_id, "Session ended");
    Ok(session)
}

/// Delete a session.
///
/// # Errors
///
/// `NotFound` or `UpstreamFailure` from the provider.
#[instrument(skip(directory))]
pub async fn delete_session(
    directory: &dyn SessionDirectory,
    session_id: &str,
) -> Result<(), PolicyError> {
    directory.delete_session(session_id).await?;
    info!(target: "sharer.services.session_policy", session_id = %session_id, "Session deleted");
    Ok(())
}
