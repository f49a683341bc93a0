//! Admission control middleware for the guarded routes.
//!
//! Counts each request against the route's [`RateLimitPolicy`] through the
//! [`crate::application::services::AdmissionController`]. Every response
//! carries `X-RateLimit-Limit`, `X-RateLimit-Remaining` and
//! `X-RateLimit-Reset` (epoch seconds); a throttled request gets
//! `429 Too Many Requests` with `Retry-After` and never reaches the handler.
//!
//! The resolved client identity is stored as a [`ClientIp`] extension for
//! the handlers behind the layer.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use crate::application::services::{RateLimitDecision, RateLimitPolicy};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_info::client_ip;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Client identity used for admission control and click records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

/// Guards `POST /shorten`.
pub async fn shorten_layer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let policy = state.settings.shorten_policy;
    enforce(&state, &policy, req, next).await
}

/// Guards `GET /r/{code}`.
pub async fn redirect_layer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let policy = state.settings.redirect_policy;
    enforce(&state, &policy, req, next).await
}

async fn enforce(state: &AppState, policy: &RateLimitPolicy, mut req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let identity = client_ip(req.headers(), peer, state.settings.behind_proxy);

    let decision = state.admission.check_rate_limit(&identity, policy).await;

    let mut response = if decision.allowed {
        req.extensions_mut().insert(ClientIp(identity));
        next.run(req).await
    } else {
        let retry_after = decision.retry_after_secs(Utc::now());
        warn!(
            identity = %identity,
            category = policy.category,
            limit = decision.limit,
            "Rate limit exceeded"
        );
        AppError::rate_limited(
            "Too many requests",
            json!({ "limit": decision.limit, "retry_after": retry_after }),
            retry_after,
        )
        .into_response()
    };

    apply_headers(response.headers_mut(), &decision);
    response
}

fn apply_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(
        X_RATELIMIT_RESET,
        HeaderValue::from(decision.reset.timestamp().max(0)),
    );
}
