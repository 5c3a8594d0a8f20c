/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use seodesk_api::{app::AppState, config::Config};
/// use seodesk_shared::store::memory::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = seodesk_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::auth::session_auth_layer, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use seodesk_shared::{
    activity::ActivityLogger, auth::session::SessionManager, dashboard::DashboardAggregator,
    store::Store,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Every
/// service holds the same `Arc<dyn Store>`, built once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Entity store
    pub store: Arc<dyn Store>,

    /// Credential checks and session tokens
    pub sessions: SessionManager,

    /// Audit trail writer
    pub activity: ActivityLogger,

    /// Dashboard snapshots
    pub dashboard: DashboardAggregator,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires every service to `store`
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let sessions = SessionManager::new(
            store.clone(),
            config.session.secret.clone(),
            config.session.ttl(),
        );

        Self {
            sessions,
            activity: ActivityLogger::new(store.clone()),
            dashboard: DashboardAggregator::new(store.clone()),
            store,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                       # Health check (public)
/// └── /api/
///     ├── POST /register, /login, /logout   (public)
///     ├── GET|PUT /user
///     ├── /clients        GET, POST      /:id GET, PUT, DELETE   /:id/projects GET
///     ├── /projects       GET, POST      /:id GET, PUT, DELETE   /:id/tasks GET   /:id/reports GET
///     ├── /tasks          GET, POST      /upcoming GET           /:id GET, PUT, DELETE
///     ├── /reports        GET, POST      /:id GET
///     └── /dashboard/stats GET
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Compression
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Session authentication (every `/api` route except register, login, logout)
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout));

    let protected_routes = Router::new()
        .route(
            "/user",
            get(routes::auth::current_user).put(routes::auth::update_user),
        )
        .route(
            "/clients",
            get(routes::clients::list_clients).post(routes::clients::create_client),
        )
        .route(
            "/clients/:id",
            get(routes::clients::get_client)
                .put(routes::clients::update_client)
                .delete(routes::clients::delete_client),
        )
        .route(
            "/clients/:id/projects",
            get(routes::clients::list_client_projects),
        )
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/projects/:id/tasks",
            get(routes::projects::list_project_tasks),
        )
        .route(
            "/projects/:id/reports",
            get(routes::projects::list_project_reports),
        )
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/tasks/upcoming", get(routes::tasks::upcoming_tasks))
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/reports",
            get(routes::reports::list_reports).post(routes::reports::create_report),
        )
        .route("/reports/:id", get(routes::reports::get_report))
        .route("/dashboard/stats", get(routes::dashboard::dashboard_stats))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let api_routes = Router::new().merge(public_routes).merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(CompressionLayer::new())
        .with_state(state)
}
