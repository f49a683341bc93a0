//! Server-rendered HTML served by the resolution path.
//!
//! - [`cloak`] - Wrapper pages for cloaked links

pub mod cloak;
