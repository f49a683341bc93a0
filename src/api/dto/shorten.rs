//! DTOs for link shortening endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use validator::Validate;

use crate::application::services::CreateLink;
use crate::domain::entities::{CloakMode, CloakSettings};
use crate::utils::code_generator::{ALIAS_MAX_LENGTH, ALIAS_MIN_LENGTH};
use crate::utils::url_normalizer::MAX_URL_LENGTH;

// validator's `length` bounds are u64
const URL_MAX_CHARS: u64 = MAX_URL_LENGTH as u64;
const ALIAS_MIN_CHARS: u64 = ALIAS_MIN_LENGTH as u64;
const ALIAS_MAX_CHARS: u64 = ALIAS_MAX_LENGTH as u64;

/// Request body for `POST /shorten`.
///
/// Only shape is checked here. Scheme handling, SSRF rules and the alias
/// character set are enforced by the link service.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    /// Destination URL; a missing scheme becomes `https://`.
    #[validate(length(min = 1, max = URL_MAX_CHARS, message = "URL must be 1-2048 characters"))]
    pub url: String,

    #[serde(default, alias = "custom_alias")]
    #[validate(length(min = ALIAS_MIN_CHARS, max = ALIAS_MAX_CHARS))]
    pub custom_alias: Option<String>,

    /// After this instant the link stops resolving.
    #[serde(default, alias = "expires_at")]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default)]
    #[validate(nested)]
    pub cloak: Option<CloakRequest>,
}

/// Cloaking options for a new link.
#[serde_as]
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CloakRequest {
    /// `IFRAME`, `JAVASCRIPT` or `META_REFRESH`, any case.
    #[serde_as(as = "DisplayFromStr")]
    pub mode: CloakMode,

    #[validate(length(max = 200))]
    pub title: Option<String>,

    #[serde(default, alias = "favicon_url")]
    #[validate(length(max = 2048))]
    pub favicon_url: Option<String>,
}

impl From<ShortenRequest> for CreateLink {
    fn from(request: ShortenRequest) -> Self {
        Self {
            url: request.url,
            custom_alias: request.custom_alias,
            owner_id: None,
            expires_at: request.expires_at,
            cloak: request.cloak.map(|cloak| CloakSettings {
                mode: cloak.mode,
                title: cloak.title,
                favicon_url: cloak.favicon_url,
            }),
        }
    }
}

/// Response for a created link.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub short_code: String,
    pub short_url: String,
}
