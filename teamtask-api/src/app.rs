/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use teamtask_api::{app::{build_router, AppState}, config::Config};
/// use teamtask_shared::cache::MemoryTasksCache;
/// use teamtask_shared::mailer::LogMailer;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(
///     pool,
///     config,
///     Arc::new(LogMailer::new()),
///     Arc::new(MemoryTasksCache::new()),
/// );
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use crate::middleware::{metrics, rbac};
use crate::services::{AuthService, CommentService, ReportService, TaskService, TeamService};
use axum::{
    extract::{FromRef, Request, State},
    handler::Handler,
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use teamtask_shared::auth::middleware::{
    jwt_auth_middleware, optional_jwt_auth_middleware, AuthError,
};
use teamtask_shared::cache::TasksCache;
use teamtask_shared::mailer::Mailer;
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Every field
/// is a pool handle or an `Arc`, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Breaker-guarded mailer
    pub mailer: Arc<dyn Mailer>,

    /// Task list cache
    pub cache: Arc<dyn TasksCache>,

    pub metrics: Arc<metrics::HttpMetrics>,

    pub auth: AuthService,
    pub teams: TeamService,
    pub tasks: TaskService,
    pub comments: CommentService,
    pub reports: ReportService,
}

impl AppState {
    /// Creates application state and wires the services
    pub fn new(
        db: PgPool,
        config: Config,
        mailer: Arc<dyn Mailer>,
        cache: Arc<dyn TasksCache>,
    ) -> Self {
        let auth = AuthService::new(
            db.clone(),
            mailer.clone(),
            config.jwt.secret.as_str(),
            config.access_ttl(),
        );
        let teams = TeamService::new(db.clone(), mailer.clone());
        let tasks = TaskService::new(db.clone(), cache.clone());
        let comments = CommentService::new(db.clone());
        let reports = ReportService::new(db.clone());

        Self {
            db,
            config: Arc::new(config),
            mailer,
            cache,
            metrics: Arc::new(metrics::HttpMetrics::new()),
            auth,
            teams,
            tasks,
            comments,
            reports,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

impl FromRef<AppState> for Arc<metrics::HttpMetrics> {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                              # public
/// ├── GET  /openapi.json                        # public
/// ├── GET  /metrics                             # public, when enabled
/// └── /api/v1/
///     ├── POST /register                        # public
///     ├── POST /login                           # public
///     ├── GET|POST /teams                       # JWT
///     ├── POST /teams/invites/accept            # JWT
///     ├── POST /teams/:id/invite                # JWT + owner|admin
///     ├── GET  /tasks                           # JWT
///     ├── POST /tasks                           # JWT + owner|admin|member
///     ├── PUT  /tasks/:id                       # JWT
///     ├── GET  /tasks/:id/history               # JWT
///     ├── GET|POST /tasks/:id/comments          # JWT
///     ├── PUT|DELETE /tasks/:id/comments/:comment_id
///     └── GET  /reports/{team-summary,top-creators,invalid-assignees}
/// ```
///
/// # Middleware Stack
///
/// Outermost first: request timeout, CORS, tracing, metrics, then per-route
/// authentication and role gates.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Public API routes: a token, if any, is read but never required
    let public_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_jwt_auth_layer,
        ));

    let protected_routes = Router::new()
        .route(
            "/teams",
            get(routes::teams::list_teams).post(routes::teams::create_team),
        )
        .route("/teams/invites/accept", post(routes::teams::accept_invite))
        .route(
            "/teams/:id/invite",
            post(routes::teams::invite.layer(middleware::from_fn(rbac::require_inviter))),
        )
        .route(
            "/tasks",
            get(routes::tasks::list_tasks)
                .post(routes::tasks::create_task.layer(middleware::from_fn(rbac::require_task_creator))),
        )
        .route("/tasks/:id", put(routes::tasks::update_task))
        .route("/tasks/:id/history", get(routes::tasks::task_history))
        .route(
            "/tasks/:id/comments",
            get(routes::comments::list_comments).post(routes::comments::create_comment),
        )
        .route(
            "/tasks/:id/comments/:comment_id",
            put(routes::comments::update_comment).delete(routes::comments::delete_comment),
        )
        .route("/reports/team-summary", get(routes::reports::team_summary))
        .route("/reports/top-creators", get(routes::reports::top_creators))
        .route(
            "/reports/invalid-assignees",
            get(routes::reports::invalid_assignees),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new().merge(public_routes).merge(protected_routes);

    let mut router = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/openapi.json", get(routes::docs::openapi_json))
        .nest("/api/v1", v1_routes);

    if state.config.metrics.enabled {
        router = router
            .route(&state.config.metrics.path, get(metrics::render_metrics))
            .route_layer(middleware::from_fn_with_state(
                state.metrics.clone(),
                metrics::track_metrics,
            ));
    }

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
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
            .max_age(std::time::Duration::from_secs(3600))
    };

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .with_state(state)
}

/// Strict JWT layer: rejects the request without a valid token
async fn jwt_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    jwt_auth_middleware(state.jwt_secret().to_string(), req, next).await
}

/// Optional JWT layer: attaches the identity when a valid token is present
async fn optional_jwt_auth_layer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    optional_jwt_auth_middleware(state.jwt_secret().to_string(), req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use axum::{body::Body, http::StatusCode};
    use teamtask_shared::cache::MemoryTasksCache;
    use teamtask_shared::db::pool::{create_lazy_pool, DatabaseConfig};
    use teamtask_shared::mailer::MockMailer;
    use tower::ServiceExt;

    fn state() -> AppState {
        let pool = create_lazy_pool(&DatabaseConfig::with_url("postgresql://localhost/unused")).unwrap();
        AppState::new(
            pool,
            test_config(),
            Arc::new(MockMailer::new()),
            Arc::new(MemoryTasksCache::new()),
        )
    }

    async fn get_status(app: Router, uri: &str) -> StatusCode {
        app.oneshot(
            axum::http::Request::builder()
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let app = build_router(state());
        assert_eq!(get_status(app, "/api/v1/teams").await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = build_router(state());
        assert_eq!(get_status(app, "/api/v1/nope").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_openapi_and_metrics_are_public() {
        let app = build_router(state());
        assert_eq!(get_status(app.clone(), "/openapi.json").await, StatusCode::OK);
        assert_eq!(get_status(app, "/metrics").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_route_absent_when_disabled() {
        let mut config = test_config();
        config.metrics.enabled = false;
        let pool = create_lazy_pool(&DatabaseConfig::with_url("postgresql://localhost/unused")).unwrap();
        let state = AppState::new(
            pool,
            config,
            Arc::new(MockMailer::new()),
            Arc::new(MemoryTasksCache::new()),
        );

        assert_eq!(
            get_status(build_router(state), "/metrics").await,
            StatusCode::NOT_FOUND
        );
    }
}
