//! Sharer service models.
//!
//! Contains the provider's wire types (camelCase JSON) and the API response
//! types returned by the sharer's own endpoints.

use serde::{Deserialize, Serialize};

/// Marker written into `comments` of every session the sharer creates.
///
/// Sessions without this marker belong to other applications in the same
/// project and are ignored by session resolution.
pub const SHARER_SESSION_COMMENTS: &str = "Created from SyncFlow Sharer";

// ============================================================================
// Sessions
// ============================================================================

/// Provider session status.
///
/// Transitions are driven by the provider; the sharer only observes them.
/// Statuses this build does not know about are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SessionStatus {
    /// Accepted by the provider, media room not yet running.
    Created,

    /// Media room is running.
    Started,

    /// Session was stopped or timed out empty.
    Ended,

    /// Any other provider status.
    Other(String),
}

impl SessionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SessionStatus::Created => "Created",
            SessionStatus::Started => "Started",
            SessionStatus::Ended => "Ended",
            SessionStatus::Other(s) => s,
        }
    }
}

impl From<String> for SessionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Created" => SessionStatus::Created,
            "Started" => SessionStatus::Started,
            "Ended" => SessionStatus::Ended,
            _ => SessionStatus::Other(value),
        }
    }
}

impl From<SessionStatus> for String {
    fn from(value: SessionStatus) -> Self {
        match value {
            SessionStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

/// A provider session.
///
/// `id` is authoritative. `name` is a human label; uniqueness among active
/// sharer sessions is enforced by the sharer, not the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,

    pub name: String,

    pub status: SessionStatus,

    #[serde(default)]
    pub comments: Option<String>,

    /// Start time in epoch milliseconds, if the provider reported one.
    #[serde(default)]
    pub started_at: Option<i64>,

    #[serde(default)]
    pub auto_recording: bool,

    #[serde(default)]
    pub max_participants: u32,

    #[serde(default)]
    pub empty_timeout: u32,
}

impl Session {
    /// Whether the media room is running.
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Started
    }

    /// Accepted by the provider but not started yet; it starts when the
    /// first participant connects.
    pub fn is_pending(&self) -> bool {
        self.status == SessionStatus::Created
    }

    /// Whether this session was created by the sharer.
    pub fn is_sharer_session(&self) -> bool {
        self.comments.as_deref() == Some(SHARER_SESSION_COMMENTS)
    }
}

/// Body of a provider create-session request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionParams {
    pub name: String,
    pub comments: String,
    pub auto_recording: bool,
    pub max_participants: u32,
    pub empty_timeout: u32,
}

/// Sharer sessions split by liveness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionListing {
    /// Sessions in status Started.
    pub active: Vec<Session>,

    /// Everything else, most recently started first.
    pub ended: Vec<Session>,
}

// ============================================================================
// Settings
// ============================================================================

/// Sharer settings, edited from the admin page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Whether sharing is offered to participants.
    pub enabled: bool,

    pub enable_audio: bool,

    pub enable_camera: bool,

    pub enable_screen_share: bool,

    /// `autoRecording` for sessions created by the sharer.
    pub record_session: bool,

    /// Name used for the next created session; replaced by the provider's
    /// canonical name after creation.
    pub session_name: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_audio: true,
            enable_camera: false,
            enable_screen_share: true,
            record_session: true,
            session_name: None,
        }
    }
}

/// Partial settings update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub enabled: Option<bool>,
    pub enable_audio: Option<bool>,
    pub enable_camera: Option<bool>,
    pub enable_screen_share: Option<bool>,
    pub record_session: Option<bool>,
    pub session_name: Option<String>,
}

// ============================================================================
// Tokens
// ============================================================================

/// Role a participant joins with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    /// Operator joining from the admin pages.
    Admin,

    /// Participant sharing their screen/camera.
    Presenter,

    /// Hidden, subscribe-only observer (preview page).
    Viewer,
}

/// Media source a participant may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishSource {
    Camera,
    ScreenShare,
    ScreenShareAudio,
    Microphone,
}

impl PublishSource {
    /// Every source, in the provider's canonical order.
    pub const ALL: [PublishSource; 4] = [
        PublishSource::Camera,
        PublishSource::ScreenShare,
        PublishSource::ScreenShareAudio,
        PublishSource::Microphone,
    ];
}

/// Permission flags embedded in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrants {
    /// Media room name (the session's name).
    pub room: String,
    pub room_join: bool,
    pub room_list: bool,
    pub room_record: bool,
    pub room_admin: bool,
    pub room_create: bool,
    pub ingress_admin: bool,
    pub hidden: bool,
    pub recorder: bool,
    pub can_publish: bool,
    pub can_subscribe: bool,
    pub can_publish_data: bool,
    pub can_update_own_metadata: bool,
    pub can_publish_sources: Vec<PublishSource>,
}

/// A fully built grant for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub identity: String,

    /// Display name; the sharer always uses the identity.
    pub name: String,

    pub role: ParticipantRole,

    pub video_grants: VideoGrants,
}

/// Body of a provider token request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest<'a> {
    pub identity: &'a str,
    pub name: &'a str,
    pub video_grants: &'a VideoGrants,
}

impl<'a> From<&'a TokenGrant> for TokenRequest<'a> {
    fn from(grant: &'a TokenGrant) -> Self {
        Self {
            identity: &grant.identity,
            name: &grant.name,
            video_grants: &grant.video_grants,
        }
    }
}

/// Token issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    /// Signed access token.
    pub token: String,

    #[serde(default)]
    pub identity: String,

    /// Media server URL the participant connects to.
    #[serde(default)]
    pub server_url: Option<String>,
}

// ============================================================================
// Project and recordings
// ============================================================================

/// Provider project details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetails {
    pub id: String,
    pub name: String,
    pub bucket_name: String,
}

/// An egress (recording) record of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub id: String,

    #[serde(default)]
    pub track_id: Option<String>,

    pub egress_id: String,

    /// Epoch milliseconds.
    #[serde(default)]
    pub started_at: Option<i64>,

    pub egress_type: String,

    pub status: String,

    /// Object path of the recorded media.
    #[serde(default)]
    pub destination: Option<String>,

    #[serde(default)]
    pub room_name: String,

    pub session_id: String,
}

/// Provider answer to a media URL request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUrl {
    pub url: String,
}

/// Recordings of one session with their context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingListing {
    /// Bucket holding the media; empty when project details were unavailable.
    pub s3_bucket_name: String,

    pub session: Session,

    pub recordings: Vec<Recording>,
}

/// Publication event reported by a participant's client.
///
/// Only `sessionName` and `identity` are interpreted; everything else is
/// stored as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationRecord {
    pub session_name: String,

    pub identity: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ============================================================================
// API responses
// ============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service health status ("healthy").
    pub status: String,
}

/// Successful admin login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: String,
}

/// Admin page payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminOverview {
    pub settings: Settings,
    pub sessions: SessionListing,
}

/// All provider sessions plus current settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsOverview {
    pub sessions: Vec<Session>,
    pub settings: Settings,
}

/// Response for every endpoint that hands out a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionResponse {
    pub token: String,
    pub identity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    pub session: Session,
}

impl JoinSessionResponse {
    pub fn new(token: SessionToken, session: Session) -> Self {
        Self {
            token: token.token,
            identity: token.identity,
            server_url: token.server_url,
            session,
        }
    }
}
