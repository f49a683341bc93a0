//! Repository trait definitions for the domain layer.
//!
//! These traits are the storage contract the resolution core depends on.
//! Implementations live in `crate::infrastructure::persistence` (PostgreSQL
//! and in-memory); `mockall` generates mocks for service tests.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Link Store contract: create, lookup, count
//! - [`TargetRepository`] - Targeting rules per link
//! - [`AbTestRepository`] - Experiments and their variants
//! - [`ClickRepository`] - Click analytics sink

pub mod ab_test_repository;
pub mod click_repository;
pub mod link_repository;
pub mod target_repository;

pub use ab_test_repository::AbTestRepository;
pub use click_repository::{ClickRepository, VariantClicks};
pub use link_repository::{LinkFilter, LinkRepository};
pub use target_repository::TargetRepository;

#[cfg(test)]
pub use ab_test_repository::MockAbTestRepository;
#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use target_repository::MockTargetRepository;
