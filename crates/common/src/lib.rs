//! Common utilities shared across SyncFlow Sharer crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for bounded polling with exponential backoff
pub mod backoff;
