//! HTTP handlers for the sharer service.

pub mod admin;
pub mod health;
pub mod login;
pub mod publication;
pub mod recordings;
pub mod sessions;
pub mod token;

pub use admin::{admin_overview, create_session, delete_session, end_session, update_settings};
pub use health::{health_check, metrics_handler};
pub use login::{login, logout};
pub use publication::publication_record;
pub use recordings::{list_recordings, media_url};
pub use sessions::{join_session, list_sessions, preview_session};
pub use token::public_token;
