//! In-memory settings store.
//!
//! Settings live for the lifetime of the process. All access goes through a
//! single mutex; updates replace the named fields and are visible to the next
//! read.

use crate::models::{Settings, SettingsUpdate};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

#[derive(Debug, Default)]
pub struct SettingsStore {
    inner: Mutex<Settings>,
}

impl SettingsStore {
    pub fn new(initial: Settings) -> Self {
        Self {
            inner: Mutex::new(initial),
        }
    }

    /// Snapshot of the current settings.
    pub fn get(&self) -> Settings {
        self.lock().clone()
    }

    /// Apply a partial update and return the resulting settings.
    pub fn update(&self, update: SettingsUpdate) -> Settings {
        let mut settings = self.lock();

        if let Some(enabled) = update.enabled {
            settings.enabled = enabled;
        }
        if let Some(enable_audio) = update.enable_audio {
            settings.enable_audio = enable_audio;
        }
        if let Some(enable_camera) = update.enable_camera {
            settings.enable_camera = enable_camera;
        }
        if let Some(enable_screen_share) = update.enable_screen_share {
            settings.enable_screen_share = enable_screen_share;
        }
        if let Some(record_session) = update.record_session {
            settings.record_session = record_session;
        }
        if let Some(session_name) = update.session_name {
            settings.session_name = Some(session_name);
        }

        info!(
            target: "sharer.services.settings",
            enabled = settings.enabled,
            record_session = settings.record_session,
            session_name = ?settings.session_name,
            "Settings updated"
        );

        settings.clone()
    }

    /// Record the provider's canonical name after a session was created.
    pub fn set_session_name(&self, name: &str) {
        self.lock().session_name = Some(name.to_string());
    }

    // A panic while holding the lock cannot leave Settings half-written
    // (every field is a plain value), so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Settings> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
