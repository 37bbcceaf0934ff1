//! HTTP routes for the sharer service.
//!
//! Defines the Axum router and application state.

use crate::auth::AdminSessions;
use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_admin};
use crate::services::directory::SessionDirectory;
use crate::services::object_store::ObjectStore;
use crate::services::session_policy::{SessionDefaults, SessionResolver};
use crate::services::settings::SettingsStore;
use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Conferencing provider.
    pub directory: Arc<dyn SessionDirectory>,

    /// Storage for publication records.
    pub object_store: Arc<dyn ObjectStore>,

    /// Process-wide sharer settings.
    pub settings: Arc<SettingsStore>,

    /// Admin login sessions.
    pub admin_sessions: Arc<AdminSessions>,

    /// Session resolution, serialized across requests.
    pub session_resolver: Arc<SessionResolver>,
}

impl AppState {
    /// Assemble state from configuration and collaborators, with default
    /// settings and no admin logged in.
    pub fn new(
        config: Config,
        directory: Arc<dyn SessionDirectory>,
        object_store: Arc<dyn ObjectStore>,
    ) -> Self {
        let session_resolver = Arc::new(SessionResolver::new(SessionDefaults::from_config(
            &config,
        )));
        let admin_sessions = Arc::new(AdminSessions::new(Duration::from_secs(
            config.admin_session_ttl_seconds,
        )));

        Self {
            config,
            directory,
            object_store,
            settings: Arc::new(SettingsStore::default()),
            admin_sessions,
            session_resolver,
        }
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health`, `/metrics` - operational endpoints, public
/// - `/api/login`, `/api/logout` - admin login, public
/// - `/api/token` - public token endpoint (CORS when an origin is configured)
/// - `/api/publication-records` - publication events, public
/// - `/api/admin/*`, `/api/sessions/*`, `/api/preview/*`, `/api/recordings/*`
///   - require the admin login cookie
/// - TraceLayer, 30 second request timeout, HTTP metrics middleware
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route(
            "/api/publication-records",
            post(handlers::publication_record),
        )
        .with_state(state.clone());

    let mut token_routes = Router::new()
        .route("/api/token", get(handlers::public_token))
        .with_state(state.clone());
    if let Some(cors) = token_cors(state.config.token_endpoint_origin.as_deref()) {
        token_routes = token_routes.layer(cors);
    }

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let admin_routes = Router::new()
        .route("/api/admin", get(handlers::admin_overview))
        .route("/api/admin/settings", post(handlers::update_settings))
        .route("/api/admin/sessions", post(handlers::create_session))
        .route("/api/admin/sessions/:id", delete(handlers::delete_session))
        .route("/api/admin/sessions/:id/end", post(handlers::end_session))
        .route("/api/sessions", get(handlers::list_sessions))
        .route("/api/sessions/:id/token", post(handlers::join_session))
        .route("/api/preview/:id", get(handlers::preview_session))
        .route("/api/recordings/:id", get(handlers::list_recordings))
        .route("/api/recordings/:id/media-url", get(handlers::media_url))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer (innermost)
    // 2. TraceLayer
    // 3. http_metrics_middleware (outermost), sees every response
    public_routes
        .merge(token_routes)
        .merge(metrics_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}

/// CORS for the public token endpoint, if an origin is configured.
fn token_cors(origin: Option<&str>) -> Option<CorsLayer> {
    let origin = origin?;
    match HeaderValue::from_str(origin) {
        Ok(value) => Some(
            CorsLayer::new()
                .allow_origin(value)
                .allow_methods([Method::GET]),
        ),
        Err(e) => {
            tracing::warn!(
                target: "sharer.routes",
                error = %e,
                "Ignoring invalid TOKEN_ENDPOINT_ORIGIN"
            );
            None
        }
    }
}
