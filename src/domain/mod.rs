//! Domain layer containing business entities and resolution logic.
//!
//! Everything here is independent of HTTP and storage technology.
//!
//! # Architecture
//!
//! - [`entities`] - Links, targets and experiments
//! - [`repositories`] - Data access trait definitions
//! - [`detected_info`] - Client attributes derived per request
//! - [`targeting`] - Priority-ordered first-match targeting
//! - [`ab_selection`] - Weighted variant selection with injectable entropy
//! - [`plan`] - Experiment ceilings per subscription tier
//! - [`click_event`] / [`click_recorder`] / [`click_worker`] - Detached click tracking
//!
//! # Click Processing Flow
//!
//! 1. The redirect handler builds a [`click_event::ClickEvent`]
//! 2. [`click_recorder::ClickRecorder`] queues it without waiting
//! 3. [`click_worker::run_click_worker`] persists it with retry logic
//! 4. Click data lands in [`repositories::ClickRepository`]

pub mod ab_selection;
pub mod click_event;
pub mod click_recorder;
pub mod click_worker;
pub mod detected_info;
pub mod entities;
pub mod plan;
pub mod repositories;
pub mod targeting;
