//! Observability module for the sharer service.

pub mod metrics;
