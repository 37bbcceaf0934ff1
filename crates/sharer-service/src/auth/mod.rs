//! Admin authentication.
//!
//! A single admin account (`ROOT_USER` / bcrypt `ROOT_PASSWORD`) logs in
//! with a password and receives an opaque `sessionId` cookie. Login sessions
//! are kept in memory with a fixed lifetime; restarting the service logs
//! everybody out.

use crate::config::MAX_ADMIN_SESSION_TTL_SECONDS;
use crate::errors::ApiError;
use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{instrument, warn};
use uuid::Uuid;

/// Name of the admin login cookie.
pub const SESSION_COOKIE: &str = "sessionId";

/// Check admin credentials.
///
/// # Errors
///
/// Returns `ApiError::Internal` if the configured hash is not a valid bcrypt
/// hash.
#[instrument(skip_all)]
pub fn verify_credentials(
    root_user: &str,
    root_password_hash: &SecretString,
    username: &str,
    password: &str,
) -> Result<bool, ApiError> {
    if username != root_user {
        return Ok(false);
    }

    bcrypt::verify(password, root_password_hash.expose_secret()).map_err(|e| {
        warn!(target: "sharer.auth", error = %e, "Configured admin password hash is unusable");
        ApiError::Internal
    })
}

/// In-memory store of admin login sessions.
#[derive(Debug)]
pub struct AdminSessions {
    ttl: Duration,
    sessions: Mutex<HashMap<String, Instant>>,
}

impl AdminSessions {
    /// `ttl` is capped at [`MAX_ADMIN_SESSION_TTL_SECONDS`].
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: ttl.min(Duration::from_secs(MAX_ADMIN_SESSION_TTL_SECONDS)),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Lifetime of a login session.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a login session and return its id.
    pub fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let now = Instant::now();

        let mut sessions = self.lock();
        sessions.retain(|_, expires_at| *expires_at > now);
        let expires_at = now.checked_add(self.ttl).unwrap_or(now);
        sessions.insert(id.clone(), expires_at);
        id
    }

    /// Whether `id` names a live login session.
    pub fn is_valid(&self, id: &str) -> bool {
        let now = Instant::now();
        let mut sessions = self.lock();

        match sessions.get(id) {
            Some(expires_at) if *expires_at > now => true,
            Some(_) => {
                sessions.remove(id);
                false
            }
            None => false,
        }
    }

    /// End a login session. Unknown ids are ignored.
    pub fn revoke(&self, id: &str) {
        self.lock().remove(id);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
