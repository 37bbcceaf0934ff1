//! Middleware for the sharer service.

pub mod auth;
pub mod http_metrics;

pub use auth::require_admin;
pub use http_metrics::http_metrics_middleware;
