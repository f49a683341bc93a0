//! Repository trait for A/B experiments.

use crate::domain::entities::{AbTest, AbVariant, NewAbTest, NewAbVariant, RunningTest};
use crate::error::AppError;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AbTestRepository: Send + Sync {
    /// Returns the running experiment of a link with its variants, if any.
    ///
    /// When several are running the oldest wins.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_running_for_link(&self, link_id: i64) -> Result<Option<RunningTest>, AppError>;

    /// Finds an experiment by ID.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_test(&self, test_id: i64) -> Result<Option<AbTest>, AppError>;

    /// Creates a running experiment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create_test(&self, new_test: NewAbTest) -> Result<AbTest, AppError>;

    /// Adds a variant to an experiment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the experiment does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn add_variant(&self, new_variant: NewAbVariant) -> Result<AbVariant, AppError>;

    /// Counts running experiments across all links of an owner.
    async fn count_running_for_owner(&self, owner_id: i64) -> Result<i64, AppError>;

    /// Counts variants of an experiment.
    async fn count_variants(&self, test_id: i64) -> Result<i64, AppError>;
}
