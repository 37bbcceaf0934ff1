//! # Sharer Test Utilities
//!
//! Shared test utilities for the sharer service.
//!
//! This crate provides:
//! - Server test harness (`TestSharerServer` for E2E tests against mock
//!   provider and object store)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sharer_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestSharerServer::spawn().await?;
//!
//!     let response = reqwest::get(format!("{}/health", server.url())).await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;

pub use server_harness::*;
