//! Handler for short URL redirect.

use axum::{
    extract::{Extension, Path, State},
    http::{HeaderMap, HeaderValue, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::api::middleware::rate_limit::ClientIp;
use crate::application::services::Resolution;
use crate::domain::click_event::ClickEvent;
use crate::domain::detected_info::DetectedInfo;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_info;

/// Resolves a short code or alias for the requesting client.
///
/// # Endpoint
///
/// `GET /r/{code}`
///
/// # Request Flow
///
/// 1. Derive device, OS, browser, country and language from the headers
/// 2. Resolve the link: matching target, else experiment variant, else the
///    link's own destination
/// 3. Respond with `307 Temporary Redirect`, or `200 text/html` with a
///    wrapper page when the link is cloaked
/// 4. Queue a click event without waiting for it
///
/// Both responses carry `Cache-Control: no-store`; the destination depends
/// on the client.
///
/// # Errors
///
/// Returns 404 Not Found if the code is unknown, inactive or expired.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Extension(ClientIp(ip)): Extension<ClientIp>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let detected = client_info::detect(&headers);

    let resolution = state.redirect_service.resolve(&code, &detected).await?;

    let mut response = match &resolution.cloak {
        Some(cloak) => {
            debug!(code = %code, mode = %cloak.mode, "Serving cloaked page");
            Html(
                state
                    .cloak_renderer
                    .render(&resolution.destination, cloak)?,
            )
            .into_response()
        }
        None => Redirect::temporary(&resolution.destination).into_response(),
    };

    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    state
        .click_recorder
        .track_click(click_event(&resolution, &detected, ip, &headers));

    Ok(response)
}

fn click_event(
    resolution: &Resolution,
    detected: &DetectedInfo,
    ip: String,
    headers: &HeaderMap,
) -> ClickEvent {
    ClickEvent {
        variant_id: resolution.variant_id,
        ip: Some(ip),
        country: detected.country.clone(),
        city: client_info::city(headers),
        device: Some(detected.device.clone()),
        browser: Some(detected.browser.clone()),
        os: Some(detected.os.clone()),
        referrer: client_info::referrer(headers),
        ..ClickEvent::new(resolution.link_id)
    }
}
