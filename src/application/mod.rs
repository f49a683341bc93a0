//! Application layer services implementing business logic.
//!
//! Services coordinate repository calls, validation and the pure domain
//! rules. Handlers and the admin CLI only talk to this layer.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Destination guard and code issuance
//! - [`services::redirect_service::RedirectService`] - Targeting and variant resolution
//! - [`services::admission_controller::AdmissionController`] - Per-client rate limiting
//! - [`services::targeting_service::TargetingService`] - Targeting rule management
//! - [`services::experiment_service::ExperimentService`] - Plan-gated A/B experiments

pub mod services;
