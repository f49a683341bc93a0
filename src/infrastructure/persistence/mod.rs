//! Repository implementations.
//!
//! Concrete implementations of the domain repository traits: PostgreSQL via
//! SQLx runtime queries, and an in-memory store.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Link storage and lookup by code or alias
//! - [`PgTargetRepository`] - Targeting rules
//! - [`PgAbTestRepository`] - Experiments and variants
//! - [`PgClickRepository`] - Click analytics sink
//! - [`MemoryStore`] - All of the above, in process

pub mod memory;
pub mod pg_ab_test_repository;
pub mod pg_click_repository;
pub mod pg_link_repository;
pub mod pg_target_repository;

pub use memory::MemoryStore;
pub use pg_ab_test_repository::PgAbTestRepository;
pub use pg_click_repository::PgClickRepository;
pub use pg_link_repository::PgLinkRepository;
pub use pg_target_repository::PgTargetRepository;
