//! Metrics definitions for the sharer service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `sharer_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: HTTP methods
//! - `endpoint`: route templates, unknown paths collapse to `/other`
//! - `status`: success, error, timeout
//! - `operation`: provider/object store calls, fixed in code
//! - `mode`, `outcome`, `role`: enum-backed

use crate::models::ParticipantRole;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and return the handle for `/metrics`.
///
/// # Errors
///
/// Returns error if the recorder cannot be installed (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("sharer_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Provider calls include session creation, which can take seconds
        .set_buckets_for_metric(
            Matcher::Prefix("sharer_upstream_request".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set upstream request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion.
///
/// Metric: `sharer_http_requests_total`, `sharer_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("sharer_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("sharer_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Map a request path to its route template.
fn normalize_endpoint(path: &str) -> &'static str {
    let parts: Vec<&str> = path.split('/').collect();

    match parts.as_slice() {
        ["", ""] => "/",
        ["", "health"] => "/health",
        ["", "metrics"] => "/metrics",
        ["", "api", "login"] => "/api/login",
        ["", "api", "logout"] => "/api/logout",
        ["", "api", "token"] => "/api/token",
        ["", "api", "publication-records"] => "/api/publication-records",
        ["", "api", "admin"] => "/api/admin",
        ["", "api", "admin", "settings"] => "/api/admin/settings",
        ["", "api", "admin", "sessions"] => "/api/admin/sessions",
        ["", "api", "admin", "sessions", _] => "/api/admin/sessions/{id}",
        ["", "api", "admin", "sessions", _, "end"] => "/api/admin/sessions/{id}/end",
        ["", "api", "sessions"] => "/api/sessions",
        ["", "api", "sessions", _, "token"] => "/api/sessions/{id}/token",
        ["", "api", "preview", _] => "/api/preview/{id}",
        ["", "api", "recordings", _] => "/api/recordings/{id}",
        ["", "api", "recordings", _, "media-url"] => "/api/recordings/{id}/media-url",
        _ => "/other",
    }
}

// ============================================================================
// Policy Metrics
// ============================================================================

/// Record a session resolution.
///
/// Metric: `sharer_session_resolutions_total`
/// Labels: `mode` (create_new, reuse_or_create), `outcome` (reused, created,
/// collision, error)
pub fn record_session_resolution(mode: &'static str, outcome: &'static str) {
    counter!("sharer_session_resolutions_total",
        "mode" => mode,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a token issuance attempt.
///
/// Metric: `sharer_tokens_issued_total`
/// Labels: `role`, `status`
pub fn record_token_issued(role: ParticipantRole, status: &'static str) {
    let role = match role {
        ParticipantRole::Admin => "admin",
        ParticipantRole::Presenter => "presenter",
        ParticipantRole::Viewer => "viewer",
    };

    counter!("sharer_tokens_issued_total",
        "role" => role,
        "status" => status
    )
    .increment(1);
}

/// Record a publication record write.
///
/// Metric: `sharer_publication_records_total`
/// Labels: `status` (stored, skipped, error)
pub fn record_publication(status: &'static str) {
    counter!("sharer_publication_records_total", "status" => status).increment(1);
}

// ============================================================================
// Upstream Metrics
// ============================================================================

/// Record a provider or object store call.
///
/// Metric: `sharer_upstream_request_duration_seconds`, `sharer_upstream_requests_total`
/// Labels: `operation`, `status`
pub fn record_upstream_call(operation: &'static str, status: &'static str, duration: Duration) {
    histogram!("sharer_upstream_request_duration_seconds",
        "operation" => operation
    )
    .record(duration.as_secs_f64());

    counter!("sharer_upstream_requests_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use metrics_util::debugging::DebuggingRecorder;

    #[test]
    fn test_categorize_status_code() {
        assert_eq!(categorize_status_code(200), "success");
        assert_eq!(categorize_status_code(204), "success");
        assert_eq!(categorize_status_code(408), "timeout");
        assert_eq!(categorize_status_code(504), "timeout");
        assert_eq!(categorize_status_code(401), "error");
        assert_eq!(categorize_status_code(502), "error");
    }

    #[test]
    fn test_normalize_static_endpoints() {
        assert_eq!(normalize_endpoint("/"), "/");
        assert_eq!(normalize_endpoint("/health"), "/health");
        assert_eq!(normalize_endpoint("/metrics"), "/metrics");
        assert_eq!(normalize_endpoint("/api/token"), "/api/token");
        assert_eq!(normalize_endpoint("/api/admin/settings"), "/api/admin/settings");
    }

    #[test]
    fn test_normalize_dynamic_endpoints() {
        assert_eq!(
            normalize_endpoint("/api/admin/sessions/abc-123"),
            "/api/admin/sessions/{id}"
        );
        assert_eq!(
            normalize_endpoint("/api/admin/sessions/abc-123/end"),
            "/api/admin/sessions/{id}/end"
        );
        assert_eq!(
            normalize_endpoint("/api/sessions/abc/token"),
            "/api/sessions/{id}/token"
        );
        assert_eq!(normalize_endpoint("/api/preview/abc"), "/api/preview/{id}");
        assert_eq!(
            normalize_endpoint("/api/recordings/abc/media-url"),
            "/api/recordings/{id}/media-url"
        );
    }

    #[test]
    fn test_normalize_unknown_paths() {
        assert_eq!(normalize_endpoint("/api/unknown"), "/other");
        assert_eq!(normalize_endpoint("/api/preview/a/b"), "/other");
        assert_eq!(normalize_endpoint(""), "/other");
    }

    #[test]
    fn test_recorded_metric_names() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_http_request("GET", "/health", 200, Duration::from_millis(3));
            record_session_resolution("create_new", "created");
            record_token_issued(ParticipantRole::Viewer, "success");
            record_upstream_call("list_sessions", "success", Duration::from_millis(20));
            record_publication("stored");
        });

        let names: Vec<String> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .map(|(key, _, _, _)| key.key().name().to_string())
            .collect();

        for expected in [
            "sharer_http_requests_total",
            "sharer_http_request_duration_seconds",
            "sharer_session_resolutions_total",
            "sharer_tokens_issued_total",
            "sharer_upstream_requests_total",
            "sharer_upstream_request_duration_seconds",
            "sharer_publication_records_total",
        ] {
            assert!(
                names.iter().any(|n| n == expected),
                "missing metric {expected}, got {names:?}"
            );
        }
    }
}
