//! SyncFlow session directory client.
//!
//! The [`SessionDirectory`] trait is the sharer's only view of the
//! conferencing provider: session lifecycle, token minting, project details
//! and egress (recording) lookup. [`SyncFlowClient`] implements it over the
//! provider's JSON API.
//!
//! # Authentication
//!
//! Every request carries a short-lived HS256 bearer JWT signed with the
//! project API secret (`iss` = API key). The secret never leaves
//! `SecretString` except to build the signing key.
//!
//! # Cancellation
//!
//! The HTTP client has connect and request timeouts; dropping a returned
//! future (e.g. when the HTTP request times out) aborts the provider call.

use crate::config::Config;
use crate::errors::PolicyError;
use crate::models::{
    CreateSessionParams, MediaUrl, ProjectDetails, Recording, Session, SessionToken, TokenGrant,
    TokenRequest,
};
use crate::observability::metrics::record_upstream_call;
use async_trait::async_trait;
use chrono::Utc;
use common::secret::{ExposeSecret, SecretString};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{instrument, warn};

/// Connect timeout for provider requests in seconds.
const SYNCFLOW_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Lifetime of the bearer JWT sent to the provider.
const API_TOKEN_TTL_SECS: i64 = 600;

/// Failure talking to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// The provider answered 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// The provider answered with another non-success status.
    #[error("provider returned {status}: {body}")]
    Http { status: u16, body: String },

    /// Network failure or timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// Success status with an unreadable body.
    #[error("invalid provider response: {0}")]
    Decode(String),

    /// Could not build the request (signing, URL).
    #[error("request construction failed: {0}")]
    Request(String),
}

impl DirectoryError {
    /// HTTP status reported by the provider, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            DirectoryError::NotFound(_) => Some(404),
            DirectoryError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<DirectoryError> for PolicyError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound(resource) => PolicyError::NotFound { resource },
            other => PolicyError::UpstreamFailure {
                status: other.status(),
                detail: other.to_string(),
            },
        }
    }
}

/// Operations against the conferencing provider.
#[async_trait]
pub trait SessionDirectory: Send + Sync {
    /// All sessions of the project, sharer-created or not.
    async fn list_sessions(&self) -> Result<Vec<Session>, DirectoryError>;

    async fn get_session(&self, session_id: &str) -> Result<Session, DirectoryError>;

    async fn create_session(&self, params: &CreateSessionParams)
        -> Result<Session, DirectoryError>;

    async fn stop_session(&self, session_id: &str) -> Result<Session, DirectoryError>;

    async fn delete_session(&self, session_id: &str) -> Result<(), DirectoryError>;

    /// Mint an access token for `grant` in the given session.
    async fn generate_token(
        &self,
        session_id: &str,
        grant: &TokenGrant,
    ) -> Result<SessionToken, DirectoryError>;

    async fn get_project_details(&self) -> Result<ProjectDetails, DirectoryError>;

    /// Egress (recording) records of a session.
    async fn list_egresses(&self, session_id: &str) -> Result<Vec<Recording>, DirectoryError>;

    /// Playable URL for a recorded object of a session.
    async fn get_media_url(&self, session_id: &str, path: &str) -> Result<String, DirectoryError>;
}

#[derive(Serialize)]
struct ApiClaims<'a> {
    iss: &'a str,
    project_id: &'a str,
    iat: i64,
    exp: i64,
}

/// HTTP client for the SyncFlow project API.
#[derive(Clone)]
pub struct SyncFlowClient {
    client: Client,
    base_url: Url,
    project_id: String,
    api_key: String,
    api_secret: SecretString,
}

impl SyncFlowClient {
    /// Create a client from service configuration.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Request` if the base URL is invalid or the
    /// HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, DirectoryError> {
        Self::new(
            &config.syncflow_server_url,
            config.syncflow_project_id.clone(),
            config.syncflow_api_key.clone(),
            config.syncflow_api_secret.clone(),
            Duration::from_secs(config.upstream_timeout_seconds),
        )
    }

    /// Create a client.
    ///
    /// # Arguments
    ///
    /// * `server_url` - Provider base URL (e.g. "https://syncflow.example.com")
    /// * `project_id` - Project all sessions belong to
    /// * `api_key` / `api_secret` - Project API credentials
    /// * `timeout` - Per-request timeout
    pub fn new(
        server_url: &str,
        project_id: String,
        api_key: String,
        api_secret: SecretString,
        timeout: Duration,
    ) -> Result<Self, DirectoryError> {
        let base_url = Url::parse(server_url).map_err(|e| {
            DirectoryError::Request(format!("invalid SyncFlow server URL: {}", e))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(SYNCFLOW_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                warn!(target: "sharer.services.directory", error = %e, "Failed to build HTTP client");
                DirectoryError::Request("failed to build HTTP client".to_string())
            })?;

        Ok(Self {
            client,
            base_url,
            project_id,
            api_key,
            api_secret,
        })
    }

    /// Build `{base}/api/projects/{project_id}/{segments...}`, escaping each
    /// segment.
    fn url(&self, segments: &[&str]) -> Result<Url, DirectoryError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                DirectoryError::Request("SyncFlow server URL cannot be a base".to_string())
            })?;
            path.pop_if_empty()
                .extend(["api", "projects", self.project_id.as_str()])
                .extend(segments);
        }
        Ok(url)
    }

    fn bearer_token(&self) -> Result<String, DirectoryError> {
        let iat = Utc::now().timestamp();
        let claims = ApiClaims {
            iss: &self.api_key,
            project_id: &self.project_id,
            iat,
            exp: iat + API_TOKEN_TTL_SECS,
        };
        let key = EncodingKey::from_secret(self.api_secret.expose_secret().as_bytes());

        encode(&Header::new(Algorithm::HS256), &claims, &key)
            .map_err(|e| DirectoryError::Request(format!("failed to sign API token: {}", e)))
    }

    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, DirectoryError> {
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(self.bearer_token()?))
    }

    /// Send a request and map the provider's answer.
    async fn send(
        &self,
        operation: &'static str,
        resource: &str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, DirectoryError> {
        let start = Instant::now();

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(target: "sharer.services.directory", operation, error = %e, "SyncFlow request failed");
                record_upstream_call(operation, "error", start.elapsed());
                return Err(DirectoryError::Transport(e.to_string()));
            }
        };

        let status = response.status();
        if status.is_success() {
            record_upstream_call(operation, "success", start.elapsed());
            return Ok(response);
        }

        record_upstream_call(operation, "error", start.elapsed());

        if status.as_u16() == 404 {
            return Err(DirectoryError::NotFound(resource.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            warn!(target: "sharer.services.directory", operation, status = %status, "SyncFlow returned server error");
        } else if status.as_u16() == 401 || status.as_u16() == 403 {
            warn!(target: "sharer.services.directory", operation, status = %status, "SyncFlow rejected API credentials");
        } else {
            warn!(target: "sharer.services.directory", operation, status = %status, body = %body, "Unexpected SyncFlow response");
        }

        Err(DirectoryError::Http {
            status: status.as_u16(),
            body,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        resource: &str,
        request: RequestBuilder,
    ) -> Result<T, DirectoryError> {
        let response = self.send(operation, resource, request).await?;
        response.json().await.map_err(|e| {
            warn!(target: "sharer.services.directory", operation, error = %e, "Failed to parse SyncFlow response");
            DirectoryError::Decode(e.to_string())
        })
    }
}

#[async_trait]
impl SessionDirectory for SyncFlowClient {
    #[instrument(skip_all, name = "sharer.directory.list_sessions")]
    async fn list_sessions(&self) -> Result<Vec<Session>, DirectoryError> {
        let request = self.request(Method::GET, self.url(&["sessions"])?)?;
        self.send_json("list_sessions", "sessions", request).await
    }

    #[instrument(skip(self), name = "sharer.directory.get_session")]
    async fn get_session(&self, session_id: &str) -> Result<Session, DirectoryError> {
        let request = self.request(Method::GET, self.url(&["sessions", session_id])?)?;
        self.send_json("get_session", &format!("session {}", session_id), request)
            .await
    }

    #[instrument(skip_all, name = "sharer.directory.create_session", fields(name = %params.name))]
    async fn create_session(
        &self,
        params: &CreateSessionParams,
    ) -> Result<Session, DirectoryError> {
        let request = self
            .request(Method::POST, self.url(&["create-session"])?)?
            .json(params);
        self.send_json("create_session", "project", request).await
    }

    #[instrument(skip(self), name = "sharer.directory.stop_session")]
    async fn stop_session(&self, session_id: &str) -> Result<Session, DirectoryError> {
        let request = self.request(Method::POST, self.url(&["sessions", session_id, "stop"])?)?;
        self.send_json("stop_session", &format!("session {}", session_id), request)
            .await
    }

    #[instrument(skip(self), name = "sharer.directory.delete_session")]
    async fn delete_session(&self, session_id: &str) -> Result<(), DirectoryError> {
        let request = self.request(Method::DELETE, self.url(&["sessions", session_id])?)?;
        self.send("delete_session", &format!("session {}", session_id), request)
            .await
            .map(|_| ())
    }

    #[instrument(skip(self, grant), name = "sharer.directory.generate_token", fields(role = ?grant.role))]
    async fn generate_token(
        &self,
        session_id: &str,
        grant: &TokenGrant,
    ) -> Result<SessionToken, DirectoryError> {
        let request = self
            .request(Method::POST, self.url(&["sessions", session_id, "token"])?)?
            .json(&TokenRequest::from(grant));
        self.send_json(
            "generate_token",
            &format!("session {}", session_id),
            request,
        )
        .await
    }

    #[instrument(skip_all, name = "sharer.directory.get_project_details")]
    async fn get_project_details(&self) -> Result<ProjectDetails, DirectoryError> {
        let request = self.request(Method::GET, self.url(&[])?)?;
        self.send_json("get_project_details", "project", request)
            .await
    }

    #[instrument(skip(self), name = "sharer.directory.list_egresses")]
    async fn list_egresses(&self, session_id: &str) -> Result<Vec<Recording>, DirectoryError> {
        let request = self.request(Method::GET, self.url(&["sessions", session_id, "egresses"])?)?;
        self.send_json(
            "list_egresses",
            &format!("egresses of session {}", session_id),
            request,
        )
        .await
    }

    #[instrument(skip(self), name = "sharer.directory.get_media_url")]
    async fn get_media_url(&self, session_id: &str, path: &str) -> Result<String, DirectoryError> {
        let request = self
            .request(
                Method::GET,
                self.url(&["sessions", session_id, "media-url"])?,
            )?
            .query(&[("path", path)]);
        let media: MediaUrl = self
            .send_json("get_media_url", &format!("media {}", path), request)
            .await?;
        Ok(media.url)
    }
}

/// Mock session directory module for testing.
///
/// In-memory provider with call counters, failure injection and an optional
/// eventual-consistency window after session creation.
pub mod mock {
    use super::*;
    use crate::models::SessionStatus;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Mutex, MutexGuard, PoisonError};

    /// Directory operations, for counting and failure injection.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum DirectoryOp {
        ListSessions,
        GetSession,
        CreateSession,
        StopSession,
        DeleteSession,
        GenerateToken,
        ProjectDetails,
        ListEgresses,
        MediaUrl,
    }

    #[derive(Default)]
    struct MockState {
        sessions: Vec<Session>,
        egresses: HashMap<String, Vec<Recording>>,
        project: Option<ProjectDetails>,
        failing: HashSet<DirectoryOp>,
        calls: HashMap<DirectoryOp, usize>,
        created: Vec<CreateSessionParams>,
        grants: Vec<(String, TokenGrant)>,
        /// Remaining `get_session` misses for freshly created sessions.
        hidden_reads: HashMap<String, u32>,
    }

    /// Mock provider for unit and integration tests.
    #[derive(Default)]
    pub struct MockSessionDirectory {
        state: Mutex<MockState>,
        canonicalize_names: bool,
        invisible_reads_after_create: u32,
    }

    impl MockSessionDirectory {
        /// Empty project with a default bucket.
        pub fn new() -> Self {
            let mock = Self::default();
            mock.lock().project = Some(ProjectDetails {
                id: "proj-1".to_string(),
                name: "sharer".to_string(),
                bucket_name: "sharer-bucket".to_string(),
            });
            mock
        }

        /// Seed the directory with existing sessions.
        pub fn with_sessions(self, sessions: Vec<Session>) -> Self {
            self.lock().sessions = sessions;
            self
        }

        /// Seed egress records for a session.
        pub fn with_egresses(self, session_id: &str, recordings: Vec<Recording>) -> Self {
            self.lock()
                .egresses
                .insert(session_id.to_string(), recordings);
            self
        }

        /// Replace (or remove) the project details.
        pub fn with_project(self, project: Option<ProjectDetails>) -> Self {
            self.lock().project = project;
            self
        }

        /// Make an operation fail with a provider 500.
        pub fn failing_on(self, op: DirectoryOp) -> Self {
            self.lock().failing.insert(op);
            self
        }

        /// Lower-case created session names and replace spaces with dashes,
        /// like a provider that normalizes names.
        pub fn canonicalizing_names(mut self) -> Self {
            self.canonicalize_names = true;
            self
        }

        /// Make `get_session` miss a new session this many times.
        pub fn eventually_consistent(mut self, invisible_reads: u32) -> Self {
            self.invisible_reads_after_create = invisible_reads;
            self
        }

        /// Number of calls made to `op`.
        pub fn call_count(&self, op: DirectoryOp) -> usize {
            self.lock().calls.get(&op).copied().unwrap_or(0)
        }

        /// Parameters of every create request, in order.
        pub fn created_params(&self) -> Vec<CreateSessionParams> {
            self.lock().created.clone()
        }

        /// `(session_id, grant)` of every token request, in order.
        pub fn issued_grants(&self) -> Vec<(String, TokenGrant)> {
            self.lock().grants.clone()
        }

        /// Current sessions.
        pub fn sessions(&self) -> Vec<Session> {
            self.lock().sessions.clone()
        }

        /// Flip a session's status, as the provider would when media starts.
        pub fn set_status(&self, session_id: &str, status: SessionStatus) {
            if let Some(session) = self
                .lock()
                .sessions
                .iter_mut()
                .find(|s| s.id == session_id)
            {
                session.status = status;
            }
        }

        fn lock(&self) -> MutexGuard<'_, MockState> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Count the call and apply failure injection.
        fn enter(&self, op: DirectoryOp) -> Result<MutexGuard<'_, MockState>, DirectoryError> {
            let mut state = self.lock();
            *state.calls.entry(op).or_insert(0) += 1;
            if state.failing.contains(&op) {
                return Err(DirectoryError::Http {
                    status: 500,
                    body: format!("mock failure in {:?}", op),
                });
            }
            Ok(state)
        }
    }

    fn find(state: &MockState, session_id: &str) -> Result<Session, DirectoryError> {
        state
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(format!("session {}", session_id)))
    }

    #[async_trait]
    impl SessionDirectory for MockSessionDirectory {
        async fn list_sessions(&self) -> Result<Vec<Session>, DirectoryError> {
            Ok(self.enter(DirectoryOp::ListSessions)?.sessions.clone())
        }

        async fn get_session(&self, session_id: &str) -> Result<Session, DirectoryError> {
            let mut state = self.enter(DirectoryOp::GetSession)?;
            if let Some(remaining) = state.hidden_reads.get_mut(session_id) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(DirectoryError::NotFound(format!("session {}", session_id)));
                }
            }
            find(&state, session_id)
        }

        async fn create_session(
            &self,
            params: &CreateSessionParams,
        ) -> Result<Session, DirectoryError> {
            let mut state = self.enter(DirectoryOp::CreateSession)?;
            state.created.push(params.clone());

            let name = if self.canonicalize_names {
                params.name.trim().to_lowercase().replace(' ', "-")
            } else {
                params.name.clone()
            };
            let session = Session {
                id: format!("session-{}", state.created.len()),
                name,
                status: SessionStatus::Created,
                comments: Some(params.comments.clone()),
                started_at: None,
                auto_recording: params.auto_recording,
                max_participants: params.max_participants,
                empty_timeout: params.empty_timeout,
            };
            state.sessions.push(session.clone());
            if self.invisible_reads_after_create > 0 {
                state
                    .hidden_reads
                    .insert(session.id.clone(), self.invisible_reads_after_create);
            }
            Ok(session)
        }

        async fn stop_session(&self, session_id: &str) -> Result<Session, DirectoryError> {
            let mut state = self.enter(DirectoryOp::StopSession)?;
            let session = state
                .sessions
                .iter_mut()
                .find(|s| s.id == session_id)
                .ok_or_else(|| DirectoryError::NotFound(format!("session {}", session_id)))?;
            session.status = SessionStatus::Ended;
            Ok(session.clone())
        }

        async fn delete_session(&self, session_id: &str) -> Result<(), DirectoryError> {
            let mut state = self.enter(DirectoryOp::DeleteSession)?;
            let before = state.sessions.len();
            state.sessions.retain(|s| s.id != session_id);
            if state.sessions.len() == before {
                return Err(DirectoryError::NotFound(format!("session {}", session_id)));
            }
            Ok(())
        }

        async fn generate_token(
            &self,
            session_id: &str,
            grant: &TokenGrant,
        ) -> Result<SessionToken, DirectoryError> {
            let mut state = self.enter(DirectoryOp::GenerateToken)?;
            find(&state, session_id)?;
            state.grants.push((session_id.to_string(), grant.clone()));
            Ok(SessionToken {
                token: format!("token-{}-{}", grant.identity, session_id),
                identity: grant.identity.clone(),
                server_url: Some("wss://media.mock".to_string()),
            })
        }

        async fn get_project_details(&self) -> Result<ProjectDetails, DirectoryError> {
            self.enter(DirectoryOp::ProjectDetails)?
                .project
                .clone()
                .ok_or_else(|| DirectoryError::NotFound("project".to_string()))
        }

        async fn list_egresses(&self, session_id: &str) -> Result<Vec<Recording>, DirectoryError> {
            let state = self.enter(DirectoryOp::ListEgresses)?;
            Ok(state.egresses.get(session_id).cloned().unwrap_or_default())
        }

        async fn get_media_url(
            &self,
            session_id: &str,
            path: &str,
        ) -> Result<String, DirectoryError> {
            let _state = self.enter(DirectoryOp::MediaUrl)?;
            Ok(format!("https://media.mock/{}/{}", session_id, path))
        }
    }

}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn client(server_url: &str) -> SyncFlowClient {
        SyncFlowClient::new(
            server_url,
            "proj 1".to_string(),
            "key".to_string(),
            SecretString::from("secret"),
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn test_url_escapes_segments() {
        let client = client("https://syncflow.example.com");
        let url = client.url(&["sessions", "a/b"]).unwrap();

        assert_eq!(
            url.as_str(),
            "https://syncflow.example.com/api/projects/proj%201/sessions/a%2Fb"
        );
    }

    #[test]
    fn test_url_keeps_base_path_prefix() {
        let client = client("https://example.com/syncflow");
        let url = client.url(&[]).unwrap();

        assert_eq!(url.as_str(), "https://example.com/syncflow/api/projects/proj%201");
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let result = SyncFlowClient::new(
            "not a url",
            "p".to_string(),
            "k".to_string(),
            SecretString::from("s"),
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(DirectoryError::Request(_))));
    }

    #[test]
    fn test_bearer_token_is_hs256_with_issuer() {
        use jsonwebtoken::{decode, DecodingKey, Validation};

        #[derive(serde::Deserialize)]
        struct Claims {
            iss: String,
            project_id: String,
            exp: i64,
            iat: i64,
        }

        let token = client("https://syncflow.example.com")
            .bearer_token()
            .unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&["key"]);
        let decoded =
            decode::<Claims>(&token, &DecodingKey::from_secret(b"secret"), &validation).unwrap();

        assert_eq!(decoded.claims.iss, "key");
        assert_eq!(decoded.claims.project_id, "proj 1");
        assert_eq!(decoded.claims.exp - decoded.claims.iat, API_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_directory_error_conversion() {
        let not_found: PolicyError = DirectoryError::NotFound("session s-1".to_string()).into();
        assert_eq!(
            not_found,
            PolicyError::NotFound {
                resource: "session s-1".to_string()
            }
        );

        let upstream: PolicyError = DirectoryError::Http {
            status: 503,
            body: "down".to_string(),
        }
        .into();
        assert!(matches!(
            upstream,
            PolicyError::UpstreamFailure {
                status: Some(503),
                ..
            }
        ));

        let transport: PolicyError = DirectoryError::Transport("timeout".to_string()).into();
        assert!(matches!(
            transport,
            PolicyError::UpstreamFailure { status: None, .. }
        ));
    }
}
