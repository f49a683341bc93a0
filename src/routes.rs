//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `POST /shorten`   - Create a short link (rate limited)
//! - `GET  /r/{code}`  - Resolve a short link (rate limited)
//! - `GET  /health`    - Health check: link store, rate limit store, click queue
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Admission control** - Fixed-window limits per client and route
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::tracing;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// Routes and middleware without path normalization.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(api::routes::public_routes(state.clone()))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(tracing::layer())
}
