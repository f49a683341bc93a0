//! Repository trait for link targeting rules.

use crate::domain::entities::{NewTarget, Target};
use crate::error::AppError;
use async_trait::async_trait;

/// Storage for per-link targeting rules.
///
/// Read-only from the resolution path; written by link-owner operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TargetRepository: Send + Sync {
    /// Lists every target of a link, active or not, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_for_link(&self, link_id: i64) -> Result<Vec<Target>, AppError>;

    /// Persists a new target.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_target: NewTarget) -> Result<Target, AppError>;
}
