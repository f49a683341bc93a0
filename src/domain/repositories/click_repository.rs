//! Repository trait for the click analytics sink.

use crate::domain::click_event::ClickEvent;
use crate::error::AppError;
use async_trait::async_trait;

/// Click total for one variant of a link. `variant_id` is `None` for clicks
/// served outside any experiment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantClicks {
    pub variant_id: Option<i64>,
    pub clicks: i64,
}

/// Write side of click analytics.
///
/// The core only writes; the count methods exist for the admin tooling.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Persists a single click event.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn record_click(&self, event: ClickEvent) -> Result<(), AppError>;

    /// Total clicks recorded for a link.
    async fn count_for_link(&self, link_id: i64) -> Result<i64, AppError>;

    /// Clicks for a link grouped by served variant.
    async fn count_by_variant(&self, link_id: i64) -> Result<Vec<VariantClicks>, AppError>;
}
