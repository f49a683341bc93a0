//! Handler for link shortening endpoint.

use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::application::services::link_service::short_url;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link for one destination URL.
///
/// # Endpoint
///
/// `POST /shorten`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/page",
///   "customAlias": "summer-sale",            // optional
///   "expiresAt": "2030-01-01T00:00:00Z",     // optional
///   "cloak": { "mode": "IFRAME", "title": "Example" }  // optional
/// }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "shortCode": "aB3dE9x",
///   "shortUrl": "https://s.example.com/r/aB3dE9x"
/// }
/// ```
///
/// # Errors
///
/// - 400 for a malformed body, URL or alias, or an SSRF-blocked destination
/// - 409 if the custom alias is taken
/// - 429 when rate limited (see [`crate::api::middleware::rate_limit`])
/// - 503 if no free short code was found
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    payload.validate()?;

    let link = state.link_service.create_short_link(payload.into()).await?;
    let short_url = short_url(&state.settings.base_url, &link.short_code);

    Ok((
        StatusCode::CREATED,
        Json(ShortenResponse {
            short_code: link.short_code,
            short_url,
        }),
    ))
}
