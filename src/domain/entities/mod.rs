//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures. Decision logic that reads them lives in
//! [`crate::domain::targeting`] and [`crate::domain::ab_selection`].
//!
//! # Entity Types
//!
//! - [`Link`] - A short code mapped to a destination, with optional cloaking
//! - [`Target`] - A conditional override destination for one link
//! - [`AbTest`] / [`AbVariant`] - A weighted experiment over destinations
//!
//! Creation inputs use separate `New*` structs.

pub mod ab_test;
pub mod link;
pub mod target;

pub use ab_test::{AbTest, AbTestStatus, AbVariant, NewAbTest, NewAbVariant, RunningTest};
pub use link::{CloakMode, CloakSettings, Link, NewLink};
pub use target::{NewTarget, Target, TargetType};
