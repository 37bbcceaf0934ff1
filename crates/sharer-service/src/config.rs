//! Sharer service configuration.
//!
//! Configuration is loaded from environment variables. All sensitive
//! fields are redacted in Debug output.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default object store port (MinIO default).
pub const DEFAULT_OBJECT_STORE_PORT: u16 = 9000;

/// Default SigV4 signing region.
pub const DEFAULT_OBJECT_STORE_REGION: &str = "us-east-1";

/// Default maximum participants for sessions created by the sharer.
pub const DEFAULT_SESSION_MAX_PARTICIPANTS: u32 = 100;

/// Default provider empty-timeout for sessions created by the sharer.
pub const DEFAULT_SESSION_EMPTY_TIMEOUT: u32 = 20_000;

/// Default budget for waiting on a new session to become visible.
pub const DEFAULT_SESSION_READY_TIMEOUT_MS: u64 = 5_000;

/// Default provider request timeout in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 10;

/// Default admin login lifetime (24 hours).
pub const DEFAULT_ADMIN_SESSION_TTL_SECONDS: u64 = 86_400;

/// Longest accepted admin login lifetime (one year).
pub const MAX_ADMIN_SESSION_TTL_SECONDS: u64 = 31_536_000;

/// Default graceful shutdown drain period.
pub const DEFAULT_DRAIN_SECONDS: u64 = 5;

/// Connection settings for the S3-compatible object store.
#[derive(Clone)]
pub struct ObjectStoreConfig {
    /// Host name of the object store (no scheme).
    pub endpoint: String,

    /// TCP port.
    pub port: u16,

    /// Use https instead of http.
    pub use_ssl: bool,

    /// Access key id.
    pub access_key: String,

    /// Secret access key.
    pub secret_key: SecretString,

    /// Signing region.
    pub region: String,
}

impl ObjectStoreConfig {
    /// Base URL including scheme and port, without a trailing slash.
    pub fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.endpoint, self.port)
    }
}

impl fmt::Debug for ObjectStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreConfig")
            .field("endpoint", &self.endpoint)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("region", &self.region)
            .finish()
    }
}

/// Sharer service configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Base URL of the SyncFlow provider, without trailing slash.
    pub syncflow_server_url: String,

    /// SyncFlow project that owns all sessions.
    pub syncflow_project_id: String,

    /// SyncFlow API key (JWT issuer).
    pub syncflow_api_key: String,

    /// SyncFlow API secret (JWT signing key).
    pub syncflow_api_secret: SecretString,

    /// Object store used for publication records.
    pub object_store: ObjectStoreConfig,

    /// Admin username. Also the identity used for preview tokens.
    pub root_user: String,

    /// Bcrypt hash of the admin password.
    pub root_password_hash: SecretString,

    /// Whether the public token endpoint answers at all.
    pub enable_token_endpoint: bool,

    /// CORS origin allowed on the public token endpoint.
    pub token_endpoint_origin: Option<String>,

    /// `maxParticipants` for created sessions.
    pub session_max_participants: u32,

    /// `emptyTimeout` for created sessions.
    pub session_empty_timeout: u32,

    /// Budget for polling a new session until the provider reports it.
    pub session_ready_timeout_ms: u64,

    /// Provider request timeout in seconds.
    pub upstream_timeout_seconds: u64,

    /// Admin login cookie lifetime in seconds.
    pub admin_session_ttl_seconds: u64,

    /// Drain period on shutdown in seconds (0 disables).
    pub drain_seconds: u64,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("syncflow_server_url", &self.syncflow_server_url)
            .field("syncflow_project_id", &self.syncflow_project_id)
            .field("syncflow_api_key", &self.syncflow_api_key)
            .field("syncflow_api_secret", &"[REDACTED]")
            .field("object_store", &self.object_store)
            .field("root_user", &self.root_user)
            .field("root_password_hash", &"[REDACTED]")
            .field("enable_token_endpoint", &self.enable_token_endpoint)
            .field("token_endpoint_origin", &self.token_endpoint_origin)
            .field("session_max_participants", &self.session_max_participants)
            .field("session_empty_timeout", &self.session_empty_timeout)
            .field("session_ready_timeout_ms", &self.session_ready_timeout_ms)
            .field("upstream_timeout_seconds", &self.upstream_timeout_seconds)
            .field("admin_session_ttl_seconds", &self.admin_session_ttl_seconds)
            .field("drain_seconds", &self.drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid URL configuration: {0}")]
    InvalidUrl(String),

    #[error("Invalid numeric configuration: {0}")]
    InvalidNumber(String),
}

fn required(vars: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    vars.get(key)
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse an optional strictly positive integer, falling back to `default`.
fn positive<T>(vars: &HashMap<String, String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default + Copy,
    T::Err: fmt::Display,
{
    let Some(value_str) = vars.get(key) else {
        return Ok(default);
    };

    let value: T = value_str.parse().map_err(|e| {
        ConfigError::InvalidNumber(format!(
            "{} must be a valid positive integer, got '{}': {}",
            key, value_str, e
        ))
    })?;

    if value <= T::default() {
        return Err(ConfigError::InvalidNumber(format!(
            "{} must be greater than 0",
            key
        )));
    }

    Ok(value)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let syncflow_server_url = required(vars, "SYNCFLOW_SERVER_URL")?;
        if !syncflow_server_url.starts_with("http://")
            && !syncflow_server_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidUrl(format!(
                "SYNCFLOW_SERVER_URL must start with http:// or https://, got '{}'",
                syncflow_server_url
            )));
        }
        let syncflow_server_url = syncflow_server_url.trim_end_matches('/').to_string();

        let syncflow_project_id = required(vars, "SYNCFLOW_PROJECT_ID")?;
        let syncflow_api_key = required(vars, "SYNCFLOW_API_KEY")?;
        let syncflow_api_secret = SecretString::from(required(vars, "SYNCFLOW_API_SECRET")?);

        let object_store = ObjectStoreConfig {
            endpoint: required(vars, "MINIO_ENDPOINT")?,
            port: positive(vars, "MINIO_PORT", DEFAULT_OBJECT_STORE_PORT)?,
            use_ssl: vars.get("MINIO_USE_SSL").is_some_and(|v| v == "true"),
            access_key: required(vars, "MINIO_ACCESS_KEY")?,
            secret_key: SecretString::from(required(vars, "MINIO_SECRET_KEY")?),
            region: vars
                .get("MINIO_REGION")
                .cloned()
                .unwrap_or_else(|| DEFAULT_OBJECT_STORE_REGION.to_string()),
        };

        let admin_session_ttl_seconds = positive(
            vars,
            "ADMIN_SESSION_TTL_SECONDS",
            DEFAULT_ADMIN_SESSION_TTL_SECONDS,
        )?;
        if admin_session_ttl_seconds > MAX_ADMIN_SESSION_TTL_SECONDS {
            return Err(ConfigError::InvalidNumber(format!(
                "ADMIN_SESSION_TTL_SECONDS must be at most {}, got {}",
                MAX_ADMIN_SESSION_TTL_SECONDS, admin_session_ttl_seconds
            )));
        }

        let root_user = required(vars, "ROOT_USER")?;
        let root_password_hash = SecretString::from(required(vars, "ROOT_PASSWORD")?);

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let enable_token_endpoint = vars
            .get("ENABLE_TOKEN_ENDPOINT")
            .is_some_and(|v| v == "true");

        let token_endpoint_origin = vars
            .get("TOKEN_ENDPOINT_ORIGIN")
            .filter(|v| !v.trim().is_empty())
            .cloned();

        Ok(Config {
            bind_address,
            syncflow_server_url,
            syncflow_project_id,
            syncflow_api_key,
            syncflow_api_secret,
            object_store,
            root_user,
            root_password_hash,
            enable_token_endpoint,
            token_endpoint_origin,
            session_max_participants: positive(
                vars,
                "SESSION_MAX_PARTICIPANTS",
                DEFAULT_SESSION_MAX_PARTICIPANTS,
            )?,
            session_empty_timeout: positive(
                vars,
                "SESSION_EMPTY_TIMEOUT",
                DEFAULT_SESSION_EMPTY_TIMEOUT,
            )?,
            session_ready_timeout_ms: positive(
                vars,
                "SESSION_READY_TIMEOUT_MS",
                DEFAULT_SESSION_READY_TIMEOUT_MS,
            )?,
            upstream_timeout_seconds: positive(
                vars,
                "UPSTREAM_TIMEOUT_SECONDS",
                DEFAULT_UPSTREAM_TIMEOUT_SECONDS,
            )?,
            admin_session_ttl_seconds,
            // Zero is meaningful here: skip the drain
            drain_seconds: match vars.get("SHARER_DRAIN_SECONDS") {
                Some(v) => v.parse().map_err(|e| {
                    ConfigError::InvalidNumber(format!(
                        "SHARER_DRAIN_SECONDS must be a valid integer, got '{}': {}",
                        v, e
                    ))
                })?,
                None => DEFAULT_DRAIN_SECONDS,
            },
        })
    }
}
