//! Service layer.
//!
//! Collaborator clients (provider directory, object store), the settings
//! store, and the policies that orchestrate them.

pub mod directory;
pub mod object_store;
pub mod publication;
pub mod recordings;
pub mod session_policy;
pub mod settings;
pub mod token_policy;
