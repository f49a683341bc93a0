//! Request-time resolution of a short code to a destination.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde_json::json;
use tracing::debug;

use crate::domain::ab_selection::{EntropySource, select_random_variant};
use crate::domain::detected_info::DetectedInfo;
use crate::domain::entities::CloakSettings;
use crate::domain::repositories::{AbTestRepository, LinkRepository, TargetRepository};
use crate::domain::targeting::find_matching_target;
use crate::error::AppError;

/// Which rule fixed the destination of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    Target,
    Variant,
    Direct,
}

impl ResolutionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Target => "target",
            Self::Variant => "variant",
            Self::Direct => "direct",
        }
    }
}

/// Outcome of resolving a short code for one request.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub link_id: i64,
    pub destination: String,
    pub cloak: Option<CloakSettings>,
    pub kind: ResolutionKind,
    pub target_id: Option<i64>,
    pub variant_id: Option<i64>,
}

/// Resolves short codes through targeting and experiments.
///
/// Order is fixed: link lookup, then the highest-priority matching target,
/// then a variant of the link's running experiment, then the link's own
/// destination. A matched target takes precedence over any experiment.
pub struct RedirectService<L, T, A>
where
    L: LinkRepository + ?Sized,
    T: TargetRepository + ?Sized,
    A: AbTestRepository + ?Sized,
{
    link_repository: Arc<L>,
    target_repository: Arc<T>,
    ab_test_repository: Arc<A>,
    entropy: Arc<dyn EntropySource>,
}

impl<L, T, A> RedirectService<L, T, A>
where
    L: LinkRepository + ?Sized,
    T: TargetRepository + ?Sized,
    A: AbTestRepository + ?Sized,
{
    pub fn new(
        link_repository: Arc<L>,
        target_repository: Arc<T>,
        ab_test_repository: Arc<A>,
        entropy: Arc<dyn EntropySource>,
    ) -> Self {
        Self {
            link_repository,
            target_repository,
            ab_test_repository,
            entropy,
        }
    }

    /// Resolves `code` for a client described by `detected`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is unknown, inactive or expired.
    /// Returns [`AppError::Internal`] on store errors.
    pub async fn resolve(&self, code: &str, detected: &DetectedInfo) -> Result<Resolution, AppError> {
        self.resolve_at(code, detected, Utc::now()).await
    }

    /// [`Self::resolve`] evaluated at a fixed instant.
    pub async fn resolve_at(
        &self,
        code: &str,
        detected: &DetectedInfo,
        now: DateTime<Utc>,
    ) -> Result<Resolution, AppError> {
        let link = self
            .link_repository
            .find_by_code(code)
            .await?
            .filter(|link| link.is_resolvable_at(now))
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "code": code })))?;

        let mut resolution = Resolution {
            link_id: link.id,
            destination: link.destination_url,
            cloak: link.cloak,
            kind: ResolutionKind::Direct,
            target_id: None,
            variant_id: None,
        };

        let targets = self.target_repository.list_for_link(link.id).await?;

        if let Some(target) = find_matching_target(&targets, detected) {
            debug!(link_id = link.id, target_id = target.id, "Target matched");
            resolution.destination = target.destination_url.clone();
            resolution.kind = ResolutionKind::Target;
            resolution.target_id = Some(target.id);
        } else if let Some(running) = self.ab_test_repository.find_running_for_link(link.id).await?
            && let Some(variant) = select_random_variant(&running.variants, self.entropy.as_ref())
        {
            debug!(
                link_id = link.id,
                test_id = running.test.id,
                variant_id = variant.id,
                "Variant selected"
            );
            resolution.destination = variant.destination_url.clone();
            resolution.kind = ResolutionKind::Variant;
            resolution.variant_id = Some(variant.id);
        }

        counter!("redirects_total", "kind" => resolution.kind.as_str()).increment(1);

        Ok(resolution)
    }
}
