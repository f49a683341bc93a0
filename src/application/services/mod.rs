//! Business logic services for the application layer.

pub mod admission_controller;
pub mod experiment_service;
pub mod link_service;
pub mod redirect_service;
pub mod targeting_service;

pub use admission_controller::{AdmissionController, RateLimitDecision, RateLimitPolicy};
pub use experiment_service::{AddVariant, ExperimentService};
pub use link_service::{CreateLink, LinkService, short_url, validate_destination};
pub use redirect_service::{RedirectService, Resolution, ResolutionKind};
pub use targeting_service::{AddTarget, TargetingService};
