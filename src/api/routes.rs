//! API Routes
//!
//! Configures the Axum router with all admin endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    estimate_handler, get_scenario_handler, health_handler, invalidate_handler,
    pregenerate_custom_handler, pregenerate_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /scenarios/:slug/:locale` - Read a cached scenario
/// - `DELETE /scenarios/:slug` - Invalidate a scenario (`?locale=` for one locale)
/// - `POST /pregenerate` - Warm the cache from the parameter grid
/// - `POST /pregenerate/custom` - Warm the cache for given combinations
/// - `GET /estimate` - Estimated scenario count of the grid
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/scenarios/:slug/:locale", get(get_scenario_handler))
        .route("/scenarios/:slug", delete(invalidate_handler))
        .route("/pregenerate", post(pregenerate_handler))
        .route("/pregenerate/custom", post(pregenerate_custom_handler))
        .route("/estimate", get(estimate_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
