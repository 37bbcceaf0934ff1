//! Test server harness for E2E testing
//!
//! Provides `TestSharerServer` for spawning real sharer server instances
//! backed by the in-crate mock provider and object store.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sharer_service::config::Config;
use sharer_service::observability::metrics::init_metrics_recorder;
use sharer_service::routes::{self, AppState};
use sharer_service::services::directory::mock::MockSessionDirectory;
use sharer_service::services::object_store::mock::MockObjectStore;
use sharer_service::services::settings::SettingsStore;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Admin username of every test server.
pub const TEST_ROOT_USER: &str = "root";

/// Admin password of every test server.
pub const TEST_ROOT_PASSWORD: &str = "sharer-test-password";

/// Global metrics handle for test servers
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Options for [`TestSharerServer::spawn_with`].
pub struct TestServerOptions {
    pub directory: Arc<MockSessionDirectory>,
    pub object_store: Arc<MockObjectStore>,
    pub enable_token_endpoint: bool,
    pub token_endpoint_origin: Option<String>,

    /// Extra or overriding environment variables.
    pub vars: Vec<(String, String)>,
}

impl Default for TestServerOptions {
    fn default() -> Self {
        Self {
            directory: Arc::new(MockSessionDirectory::new()),
            object_store: Arc::new(MockObjectStore::new()),
            enable_token_endpoint: true,
            token_endpoint_origin: None,
            vars: Vec::new(),
        }
    }
}

/// Test harness for spawning the sharer server in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() -> Result<(), anyhow::Error> {
///     let server = TestSharerServer::spawn().await?;
///
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestSharerServer {
    addr: SocketAddr,
    config: Config,
    directory: Arc<MockSessionDirectory>,
    object_store: Arc<MockObjectStore>,
    settings: Arc<SettingsStore>,
    _handle: JoinHandle<()>,
}

impl TestSharerServer {
    /// Spawn a server with an empty mock provider and the token endpoint
    /// enabled.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with(TestServerOptions::default()).await
    }

    /// Spawn a server with the given mocks and options.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    pub async fn spawn_with(options: TestServerOptions) -> Result<Self, anyhow::Error> {
        let password_hash = bcrypt::hash(TEST_ROOT_PASSWORD, 4)
            .map_err(|e| anyhow::anyhow!("Failed to hash test password: {}", e))?;

        let mut vars = HashMap::from([
            (
                "SYNCFLOW_SERVER_URL".to_string(),
                "http://syncflow.test".to_string(),
            ),
            ("SYNCFLOW_PROJECT_ID".to_string(), "proj-1".to_string()),
            ("SYNCFLOW_API_KEY".to_string(), "test-key".to_string()),
            ("SYNCFLOW_API_SECRET".to_string(), "test-secret".to_string()),
            ("MINIO_ENDPOINT".to_string(), "minio.test".to_string()),
            ("MINIO_ACCESS_KEY".to_string(), "test-access".to_string()),
            ("MINIO_SECRET_KEY".to_string(), "test-secret".to_string()),
            ("ROOT_USER".to_string(), TEST_ROOT_USER.to_string()),
            ("ROOT_PASSWORD".to_string(), password_hash),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("SESSION_READY_TIMEOUT_MS".to_string(), "200".to_string()),
            (
                "ENABLE_TOKEN_ENDPOINT".to_string(),
                options.enable_token_endpoint.to_string(),
            ),
        ]);
        if let Some(origin) = options.token_endpoint_origin {
            vars.insert("TOKEN_ENDPOINT_ORIGIN".to_string(), origin);
        }
        vars.extend(options.vars);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = AppState::new(
            config.clone(),
            options.directory.clone(),
            options.object_store.clone(),
        );
        let settings = state.settings.clone();

        let app = routes::build_routes(Arc::new(state), test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            directory: options.directory,
            object_store: options.object_store,
            settings,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The mock provider behind the server.
    pub fn directory(&self) -> &MockSessionDirectory {
        &self.directory
    }

    /// The mock object store behind the server.
    pub fn object_store(&self) -> &MockObjectStore {
        &self.object_store
    }

    /// The server's live settings.
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Log in as the admin and return the `Cookie` header value to send.
    pub async fn login(&self, client: &reqwest::Client) -> Result<String, anyhow::Error> {
        let response = client
            .post(format!("{}/api/login", self.url()))
            .form(&[
                ("username", TEST_ROOT_USER),
                ("password", TEST_ROOT_PASSWORD),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Login failed with status {}", response.status());
        }

        let set_cookie = response
            .headers()
            .get(reqwest::header::SET_COOKIE)
            .ok_or_else(|| anyhow::anyhow!("Login response has no Set-Cookie header"))?
            .to_str()?;

        let pair = set_cookie
            .split(';')
            .next()
            .ok_or_else(|| anyhow::anyhow!("Malformed Set-Cookie header"))?;

        Ok(pair.trim().to_string())
    }
}

impl Drop for TestSharerServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
