//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and rate-limit counters.
//!
//! # Modules
//!
//! - [`persistence`] - PostgreSQL and in-memory repository implementations
//! - [`rate_limit`] - Redis and in-process counter stores

pub mod persistence;
pub mod rate_limit;
