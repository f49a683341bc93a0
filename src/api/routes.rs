//! Public route configuration.
//!
//! Both guarded routes sit behind their own admission policy from
//! [`crate::api::middleware::rate_limit`].

use crate::api::handlers::{redirect_handler, shorten_handler};
use crate::api::middleware::rate_limit;
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Link creation and resolution routes.
///
/// # Endpoints
///
/// - `POST /shorten`   - Create a short link
/// - `GET  /r/{code}`  - Resolve a short code or alias
pub fn public_routes(state: AppState) -> Router<AppState> {
    let shorten = Router::new()
        .route("/shorten", post(shorten_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::shorten_layer,
        ));

    let redirect = Router::new()
        .route("/r/{code}", get(redirect_handler))
        .route_layer(middleware::from_fn_with_state(
            state,
            rate_limit::redirect_layer,
        ));

    Router::new().merge(shorten).merge(redirect)
}
