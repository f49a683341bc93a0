//! Repository trait for short link data access.

use crate::domain::entities::{Link, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Filter for [`LinkRepository::count`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkFilter {
    /// Only links belonging to this owner.
    pub owner_id: Option<i64>,
    /// Only links that are currently active.
    pub only_active: bool,
}

impl LinkFilter {
    pub fn for_owner(owner_id: i64) -> Self {
        Self {
            owner_id: Some(owner_id),
            only_active: false,
        }
    }
}

/// Repository interface for managing short links.
///
/// The store owns uniqueness: the core never checks a code and then trusts
/// that check, it relies on `create` failing on a duplicate and retries.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryStore`] - in-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new short link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code already exists.
    /// Returns [`AppError::AliasTaken`] if the custom alias already exists.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link whose short code or custom alias equals `code`.
    ///
    /// Returns the link regardless of its active or expiry state; callers
    /// decide whether it resolves.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Finds a link by its database ID.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError>;

    /// Counts links matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count(&self, filter: LinkFilter) -> Result<i64, AppError>;
}
