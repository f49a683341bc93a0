//! Utility functions for destination validation, code issuance and request
//! inspection.
//!
//! - [`ssrf_guard`] - SSRF checks for outbound URLs
//! - [`url_normalizer`] - URL normalization
//! - [`code_generator`] - Short code generation and alias validation
//! - [`client_info`] - Client attributes and identity from headers

pub mod client_info;
pub mod code_generator;
pub mod ssrf_guard;
pub mod url_normalizer;
