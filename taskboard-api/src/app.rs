/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_api::{app::{build_router, AppState}, config::Config};
/// use taskboard_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(MemoryStore::new_shared(), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::security::SecurityHeadersLayer,
    routes,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use taskboard_shared::{
    auth::{
        authorization::ADMIN_ONLY,
        middleware::{authenticate, AuthContext},
    },
    store::EntityStore,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Entity store backing every handler
    pub store: Arc<dyn EntityStore>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn EntityStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health                         public
/// └── /api
///     ├── /auth
///     │   ├── POST /register              public
///     │   ├── POST /login                 public
///     │   ├── POST /logout                authenticated
///     │   └── GET  /me                    authenticated
///     ├── /projects                       authenticated
///     │   ├── POST / , GET /
///     │   └── GET /:id, PUT /:id, DELETE /:id (admin)
///     ├── /tasks                          authenticated
///     │   ├── POST / , GET /
///     │   ├── GET /project/:project_id
///     │   └── GET /:id, PUT /:id, DELETE /:id (admin)
///     └── /users                          authenticated
///         ├── GET /                       admin
///         ├── PUT /block/:user_id         admin
///         ├── PUT /activate/:user_id      admin
///         ├── DELETE /delete/:user_id     admin
///         └── POST /assign-task
/// ```
///
/// Middleware, outermost first: security headers, CORS, tracing, then
/// per-group authentication and per-route admin gates.
pub fn build_router(state: AppState) -> Router {
    let admin = || middleware::from_fn(require_admin);
    let auth = || middleware::from_fn_with_state(state.clone(), jwt_auth_layer);

    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let session_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route("/me", get(routes::auth::me))
        .layer(auth());

    let project_routes = Router::new()
        .route(
            "/",
            post(routes::projects::create_project).get(routes::projects::list_projects),
        )
        .route(
            "/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .merge(delete(routes::projects::delete_project).route_layer(admin())),
        )
        .layer(auth());

    let task_routes = Router::new()
        .route(
            "/",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route("/project/:project_id", get(routes::tasks::list_tasks_by_project))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .merge(delete(routes::tasks::delete_task).route_layer(admin())),
        )
        .layer(auth());

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/block/:user_id", put(routes::users::block_user))
        .route("/activate/:user_id", put(routes::users::activate_user))
        .route("/delete/:user_id", delete(routes::users::delete_user))
        .route_layer(admin())
        .route("/assign-task", post(routes::users::assign_task))
        .layer(auth());

    let api_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(session_routes))
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/users", user_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Permissive CORS when no origins are configured, otherwise an allow-list
fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
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
}

/// Bearer authentication layer
///
/// Validates the token, reloads the user and injects [`AuthContext`] into
/// request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(state.store.as_ref(), state.jwt_secret(), req.headers()).await?;
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// Admin gate for routes that require the admin role
///
/// Runs inside [`jwt_auth_layer`], so the context is always present.
async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let is_admin = req
        .extensions()
        .get::<AuthContext>()
        .map(AuthContext::is_admin)
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    if !is_admin {
        return Err(ApiError::Forbidden(ADMIN_ONLY.to_string()));
    }

    Ok(next.run(req).await)
}
