//! Admin page handlers: settings and session lifecycle.

use crate::errors::ApiError;
use crate::models::{AdminOverview, Session, Settings, SettingsUpdate};
use crate::routes::AppState;
use crate::services::session_policy::{self, ResolutionMode};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Form, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Settings form. Toggles are `"yes"`/`"no"`; absent fields stay unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsForm {
    pub enabled: Option<String>,
    pub enable_audio: Option<String>,
    pub enable_camera: Option<String>,
    pub enable_screen_share: Option<String>,
    pub record_session: Option<String>,
    pub session_name: Option<String>,
}

fn is_yes(value: Option<String>) -> Option<bool> {
    value.map(|v| v == "yes")
}

impl From<SettingsForm> for SettingsUpdate {
    fn from(form: SettingsForm) -> Self {
        Self {
            enabled: is_yes(form.enabled),
            enable_audio: is_yes(form.enable_audio),
            enable_camera: is_yes(form.enable_camera),
            enable_screen_share: is_yes(form.enable_screen_share),
            record_session: is_yes(form.record_session),
            session_name: form
                .session_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
        }
    }
}

/// `GET /api/admin`
///
/// A failing provider listing degrades to empty lists so the settings stay
/// editable.
#[instrument(skip_all, name = "sharer.handlers.admin_overview")]
pub async fn admin_overview(State(state): State<Arc<AppState>>) -> Json<AdminOverview> {
    let sessions = session_policy::list_sharer_sessions(state.directory.as_ref())
        .await
        .unwrap_or_else(|e| {
            warn!(target: "sharer.handlers.admin", error = %e, "Session listing unavailable");
            Default::default()
        });

    Json(AdminOverview {
        settings: state.settings.get(),
        sessions,
    })
}

/// `POST /api/admin/settings`
#[instrument(skip_all, name = "sharer.handlers.update_settings")]
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SettingsForm>,
) -> Json<Settings> {
    Json(state.settings.update(form.into()))
}

/// `POST /api/admin/sessions`
///
/// Creates a session named after the current settings. 409 if a running
/// sharer session already has that name.
#[instrument(skip_all, name = "sharer.handlers.create_session")]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let session = state
        .session_resolver
        .resolve(
            &state.settings,
            state.directory.as_ref(),
            ResolutionMode::CreateNew,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// `POST /api/admin/sessions/:id/end`
#[instrument(skip_all, name = "sharer.handlers.end_session")]
pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    let session = session_policy::end_session(state.directory.as_ref(), &session_id).await?;
    Ok(Json(session))
}

/// `DELETE /api/admin/sessions/:id`
#[instrument(skip_all, name = "sharer.handlers.delete_session")]
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    session_policy::delete_session(state.directory.as_ref(), &session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
