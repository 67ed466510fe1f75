/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskhub_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
/// use taskhub_shared::email::Mailer;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config, Mailer::disabled());
/// let app = taskhub_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```
use crate::{config::Config, middleware::require_auth, routes};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhub_shared::{avatar::MAX_AVATAR_BYTES, email::Mailer};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outbound mail client, disabled when SMTP is not configured
    pub mailer: Mailer,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, mailer: Mailer) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                    # Health check (public)
/// ├── /users
/// │   ├── POST   /               # Register (public)
/// │   ├── POST   /login          # Login (public)
/// │   ├── GET    /:id/avatar     # Fetch avatar (public)
/// │   ├── POST   /logout         # Revoke current token
/// │   ├── POST   /logoutAll      # Revoke every token
/// │   ├── GET    /me             # Read profile
/// │   ├── PATCH  /me             # Update profile
/// │   ├── DELETE /me             # Delete account
/// │   ├── POST   /me/avatar      # Upload avatar
/// │   └── DELETE /me/avatar      # Remove avatar
/// └── /tasks                     # All authenticated
///     ├── POST   /
///     ├── GET    /
///     ├── GET    /:id
///     ├── PATCH  /:id
///     └── DELETE /:id
/// ```
///
/// `/users/me/avatar` and `/users/:id/avatar` coexist because the router
/// prefers the literal segment over the parameter.
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    // Public: no token required
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/users", post(routes::users::register))
        .route("/users/login", post(routes::users::login))
        .route("/users/:id/avatar", get(routes::avatar::get_avatar));

    // Everything else runs behind the bearer-token middleware
    let protected_routes = Router::new()
        .route("/users/logout", post(routes::users::logout))
        .route("/users/logoutAll", post(routes::users::logout_all))
        .route(
            "/users/me",
            get(routes::users::get_me)
                .patch(routes::users::update_me)
                .delete(routes::users::delete_me),
        )
        .route(
            "/users/me/avatar",
            post(routes::avatar::upload_avatar).delete(routes::avatar::delete_avatar),
        )
        .route(
            "/tasks",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Must stay above the avatar cap; oversize uploads are rejected by
        // the per-field size check, not the transport limit
        .layer(DefaultBodyLimit::max(MAX_AVATAR_BYTES * 2))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
