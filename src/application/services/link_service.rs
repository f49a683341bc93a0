//! Link creation and retrieval service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::entities::{CloakSettings, Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::code_generator::{generate_code, validate_custom_alias};
use crate::utils::ssrf_guard::check_url;
use crate::utils::url_normalizer::normalize;

/// Generated-code attempts before creation gives up.
pub const MAX_CODE_ATTEMPTS: usize = 5;

/// Input for [`LinkService::create_short_link`].
#[derive(Debug, Clone, Default)]
pub struct CreateLink {
    pub url: String,
    pub custom_alias: Option<String>,
    pub owner_id: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub cloak: Option<CloakSettings>,
}

impl CreateLink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Normalizes a user-supplied outbound URL and runs the SSRF guard on it.
///
/// Shared by every feature that accepts a destination: links, targets,
/// variants and favicons.
///
/// # Errors
///
/// Returns [`AppError::Validation`] for blank or oversized input and
/// [`AppError::SsrfBlocked`] when the guard rejects the URL.
pub fn validate_destination(raw: &str) -> Result<String, AppError> {
    let normalized = normalize(raw).map_err(|e| {
        AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
    })?;

    match check_url(&normalized) {
        Ok(url) => Ok(url.to_string()),
        Err(violation) => {
            counter!("ssrf_blocked_total", "category" => violation.category()).increment(1);
            warn!(
                category = violation.category(),
                reason = %violation,
                "Rejected unsafe destination"
            );
            Err(AppError::ssrf_blocked(
                "Destination URL is not allowed",
                json!({ "category": violation.category(), "reason": violation.to_string() }),
            ))
        }
    }
}

/// Service for creating and retrieving shortened links.
///
/// Every destination is normalized and SSRF-checked before anything is
/// written. Generated codes are retried a bounded number of times on
/// collision; aliases are never retried.
pub struct LinkService<L: LinkRepository + ?Sized> {
    link_repository: Arc<L>,
    code_length: usize,
}

impl<L: LinkRepository + ?Sized> LinkService<L> {
    /// Creates a new link service issuing codes of `code_length` characters.
    pub fn new(link_repository: Arc<L>, code_length: usize) -> Self {
        Self {
            link_repository,
            code_length,
        }
    }

    /// Creates a short link.
    ///
    /// # Code Issuance
    ///
    /// - With `custom_alias`: validates it and stores it as both the short
    ///   code and the alias
    /// - Otherwise: generates a random code, skipping codes already in the
    ///   store, up to [`MAX_CODE_ATTEMPTS`] times
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a malformed URL or alias.
    /// Returns [`AppError::SsrfBlocked`] for an unsafe destination or favicon.
    /// Returns [`AppError::AliasTaken`] if the alias is already issued.
    /// Returns [`AppError::CollisionExhausted`] if every generated code collided.
    pub async fn create_short_link(&self, request: CreateLink) -> Result<Link, AppError> {
        let destination_url = validate_destination(&request.url)?;

        let cloak = match request.cloak {
            Some(mut cloak) => {
                cloak.favicon_url = cloak
                    .favicon_url
                    .as_deref()
                    .map(validate_destination)
                    .transpose()?;
                Some(cloak)
            }
            None => None,
        };

        let template = NewLink {
            short_code: String::new(),
            custom_alias: None,
            destination_url,
            owner_id: request.owner_id,
            expires_at: request.expires_at,
            cloak,
        };

        let link = match request.custom_alias {
            Some(alias) => self.create_with_alias(alias, template).await?,
            None => self.create_with_generated_code(template).await?,
        };

        counter!("links_created_total").increment(1);
        info!(
            link_id = link.id,
            code = %link.short_code,
            "Short link created"
        );

        Ok(link)
    }

    async fn create_with_alias(&self, alias: String, template: NewLink) -> Result<Link, AppError> {
        validate_custom_alias(&alias)?;

        let taken = || AppError::alias_taken("Custom alias is already taken", json!({ "alias": alias }));

        if self.link_repository.find_by_code(&alias).await?.is_some() {
            return Err(taken());
        }

        let new_link = NewLink {
            short_code: alias.clone(),
            custom_alias: Some(alias.clone()),
            ..template
        };

        match self.link_repository.create(new_link).await {
            Err(AppError::Conflict { .. }) => Err(taken()),
            other => other,
        }
    }

    async fn create_with_generated_code(&self, template: NewLink) -> Result<Link, AppError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate_code(self.code_length);

            if self.link_repository.find_by_code(&code).await?.is_some() {
                debug!(attempt, "Generated code already in use, retrying");
                continue;
            }

            let new_link = NewLink {
                short_code: code,
                ..template.clone()
            };

            match self.link_repository.create(new_link).await {
                Ok(link) => return Ok(link),
                Err(AppError::Conflict { .. }) => {
                    debug!(attempt, "Generated code lost a creation race, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(attempts = MAX_CODE_ATTEMPTS, "Short code generation exhausted");
        Err(AppError::collision_exhausted(
            "Failed to generate a unique short code",
            json!({ "attempts": MAX_CODE_ATTEMPTS }),
        ))
    }

    /// Retrieves a link by its short code or alias.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link matches.
    pub async fn get_link_by_code(&self, code: &str) -> Result<Link, AppError> {
        self.link_repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "code": code })))
    }
}

/// Builds the public short URL for `code`.
pub fn short_url(base_url: &str, code: &str) -> String {
    format!("{}/r/{}", base_url.trim_end_matches('/'), code)
}
