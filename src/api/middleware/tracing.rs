//! HTTP request/response tracing middleware.

use axum::extract::{MatchedPath, Request};
use std::time::Duration;
use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, ServerErrorsFailureClass, SharedClassifier};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{Level, Span};

type MakeSpanFn = fn(&Request) -> Span;
type OnFailureFn = fn(ServerErrorsFailureClass, Duration, &Span);

/// Creates a tracing middleware for HTTP requests.
///
/// The span carries the route template (`/r/{code}`) rather than the raw
/// path, plus the concrete path as `uri`. Responses are logged at `INFO`
/// with latency in milliseconds; 5xx responses are logged at `ERROR`.
///
/// ```text
/// INFO request{method=GET route=/r/{code} uri=/r/aB3dE9x}: finished processing request latency=2 ms status=307
/// ```
pub fn layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    MakeSpanFn,
    tower_http::trace::DefaultOnRequest,
    DefaultOnResponse,
    tower_http::trace::DefaultOnBodyChunk,
    tower_http::trace::DefaultOnEos,
    OnFailureFn,
> {
    TraceLayer::new_for_http()
        .make_span_with(make_span as MakeSpanFn)
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
        .on_failure(on_failure as OnFailureFn)
}

fn make_span(request: &Request) -> Span {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or("unmatched");

    tracing::info_span!(
        "request",
        method = %request.method(),
        route = route,
        uri = %request.uri().path(),
    )
}

fn on_failure(failure: ServerErrorsFailureClass, latency: Duration, _span: &Span) {
    tracing::error!(
        classification = %failure,
        latency_ms = latency.as_millis() as u64,
        "Request failed"
    );
}
