//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::domain::repositories::LinkFilter;
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Link store**: Runs a count query
/// 2. **Rate limit store**: Pings the shared counter store, if configured
/// 3. **Click queue**: Checks if the channel is open and reports free slots
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "link_store": { "status": "ok", "message": "Connected, 42 links" },
///     "rate_limit_store": { "status": "ok", "message": "redis reachable" },
///     "click_queue": { "status": "ok", "message": "Capacity: 10000" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let link_store = check_link_store(&state).await;
    let rate_limit_store = check_rate_limit_store(&state).await;
    let click_queue = check_click_queue(&state);

    let all_healthy = link_store.is_ok() && rate_limit_store.is_ok() && click_queue.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            link_store,
            rate_limit_store,
            click_queue,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_link_store(state: &AppState) -> CheckStatus {
    match state.repositories.links.count(LinkFilter::default()).await {
        Ok(count) => CheckStatus::ok(format!("Connected, {count} links")),
        Err(e) => CheckStatus::error(format!("Link store error: {e}")),
    }
}

/// A down shared store is degraded but still serving from the fallback.
async fn check_rate_limit_store(state: &AppState) -> CheckStatus {
    let backend = state.admission.backend_name();

    if state.admission.primary_healthy().await {
        CheckStatus::ok(format!("{backend} reachable"))
    } else {
        CheckStatus::error(format!("{backend} unreachable, using in-process counters"))
    }
}

fn check_click_queue(state: &AppState) -> CheckStatus {
    if state.click_recorder.is_closed() {
        CheckStatus::error("Click queue is closed")
    } else {
        CheckStatus::ok(format!("Capacity: {}", state.click_recorder.capacity()))
    }
}
