//! Sharer service error types.
//!
//! Two layers:
//! - [`PolicyError`] is returned by the session, token and recording
//!   policies. It separates "collaborator call failed" from "business rule
//!   rejected" and is serializable so any caller can report it.
//! - [`ApiError`] adds the HTTP-only failures (auth, request parsing) and maps
//!   everything to a status code and a `{"error": {"code", "message"}}` body
//!   via `IntoResponse`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error returned by the orchestration policies.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyError {
    /// The provider could not be reached or answered with an error.
    #[error("SyncFlow request failed (status {status:?}): {detail}")]
    UpstreamFailure {
        status: Option<u16>,
        detail: String,
    },

    /// An active sharer session already uses the requested name.
    #[error("Session with name {name} already exists and running, please end the session first.")]
    SessionNameCollision { name: String },

    /// The provider refused or failed to mint a token.
    #[error("Token issuance failed: {detail}")]
    TokenIssuanceFailed { detail: String },

    /// Session or recording does not exist.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Operation needs a running session.
    #[error("Session not active: {session_id}")]
    SessionNotActive { session_id: String },

    /// Caller supplied unusable input (e.g. no session name configured).
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },
}

impl PolicyError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            PolicyError::UpstreamFailure { .. } => "UPSTREAM_FAILURE",
            PolicyError::SessionNameCollision { .. } => "SESSION_EXISTS",
            PolicyError::TokenIssuanceFailed { .. } => "TOKEN_ISSUANCE_FAILED",
            PolicyError::NotFound { .. } => "NOT_FOUND",
            PolicyError::SessionNotActive { .. } => "SESSION_NOT_ACTIVE",
            PolicyError::InvalidRequest { .. } => "BAD_REQUEST",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            PolicyError::UpstreamFailure { .. } | PolicyError::TokenIssuanceFailed { .. } => 502,
            PolicyError::SessionNameCollision { .. } => 409,
            PolicyError::NotFound { .. } => 404,
            PolicyError::SessionNotActive { .. } | PolicyError::InvalidRequest { .. } => 400,
        }
    }
}

/// HTTP boundary error.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Token endpoint not authorized")]
    TokenEndpointDisabled,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Policy(err) => err.status_code(),
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) | ApiError::TokenEndpointDisabled => 401,
            ApiError::Internal => 500,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, message) = match &self {
            ApiError::Policy(err) => {
                if let PolicyError::UpstreamFailure { status, detail } = err {
                    tracing::warn!(
                        target: "sharer.errors",
                        upstream_status = ?status,
                        detail = %detail,
                        "Upstream failure surfaced to caller"
                    );
                }
                (err.code(), err.to_string())
            }
            ApiError::BadRequest(reason) => ("BAD_REQUEST", reason.clone()),
            ApiError::Unauthorized(reason) => ("UNAUTHORIZED", reason.clone()),
            ApiError::TokenEndpointDisabled => ("UNAUTHORIZED", self.to_string()),
            ApiError::Internal => ("INTERNAL_ERROR", "An internal error occurred".to_string()),
        };

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}
