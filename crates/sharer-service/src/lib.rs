//! SyncFlow Sharer Service Library
//!
//! A thin broker in front of the SyncFlow conferencing provider. It decides
//! which session a participant joins (reuse a running one or create one),
//! mints per-role access tokens, exposes recordings, and stores publication
//! records in S3-compatible storage.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/*_policy.rs -> services/{directory,object_store}.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Admin credentials and login sessions
//! - `config` - Service configuration from environment
//! - `errors` - Policy and HTTP error types
//! - `handlers` - HTTP request handlers
//! - `middleware` - Admin cookie gate and HTTP metrics
//! - `models` - Provider wire types and API responses
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router and application state
//! - `services` - Collaborator clients, settings store and policies

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
