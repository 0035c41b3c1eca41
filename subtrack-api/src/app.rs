/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use subtrack_api::{app::AppState, config::Config};
/// use subtrack_shared::store::PgStore;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let store = Arc::new(PgStore::new(pool.clone()));
/// let state = AppState::new(pool, config, store);
/// let app = subtrack_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, service::SubscriptionService};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use subtrack_shared::auth::jwt::{self, Identity};
use subtrack_shared::store::SubscriptionStore;
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
    /// Database connection pool, used directly only by the health check
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Orchestration service backing all subscription and user endpoints
    pub service: SubscriptionService,
}

impl AppState {
    /// Creates new application state
    ///
    /// The retry policy handed to the service comes from configuration, so
    /// tests can construct the state with a fast policy.
    pub fn new(db: PgPool, config: Config, store: Arc<dyn SubscriptionStore>) -> Self {
        let service = SubscriptionService::new(store, config.retry_policy());
        Self {
            db,
            config: Arc::new(config),
            service,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// The router is organized as follows:
/// ```text
/// /
/// ├── /health                        # Health check (public)
/// ├── /v1/                           # API v1 (versioned)
/// │   ├── /users/                    # User endpoints (public)
/// │   │   ├── POST /                 # Register
/// │   │   └── POST /authenticate     # Login, returns a JWT
/// │   └── /subscriptions/            # Subscription endpoints (authenticated)
/// │       ├── GET    /?user_id=N
/// │       ├── GET    /active
/// │       ├── GET    /remaining-days?subscription_id=N
/// │       ├── POST   /
/// │       ├── PUT    /?subscription_id=N
/// │       └── DELETE /?subscription_id=N
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (subscription routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // User routes (public, no auth required)
    let user_routes = Router::new()
        .route("/", post(routes::users::register))
        .route("/authenticate", post(routes::users::authenticate));

    // Subscription routes (require JWT authentication)
    let subscription_routes = Router::new()
        .route("/", get(routes::subscriptions::list_for_user))
        .route("/active", get(routes::subscriptions::list_active))
        .route(
            "/remaining-days",
            get(routes::subscriptions::remaining_days),
        )
        .route("/", post(routes::subscriptions::create))
        .route("/", put(routes::subscriptions::update))
        .route("/", delete(routes::subscriptions::remove))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/subscriptions", subscription_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
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

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the JWT bearer token from the Authorization
/// header, then injects the caller's [`Identity`] into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    // Extract Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    // Parse Bearer token
    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        crate::error::ApiError::BadRequest("Expected Bearer token".to_string())
    })?;

    // Validate token
    let claims = jwt::validate_token(token, state.jwt_secret())?;

    // Insert the caller identity into request extensions
    req.extensions_mut().insert(Identity::from(claims));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_cloneable() {
        // Compile-time check; cloning must stay cheap for per-request use
        fn assert_clone<T: Clone + Send + Sync + 'static>() {}
        assert_clone::<AppState>();
    }
}
