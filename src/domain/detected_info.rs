//! Client attributes derived from a single request.

use crate::domain::entities::TargetType;

/// Per-request client attributes used by the targeting matcher.
///
/// Derived from the `User-Agent` and edge headers by
/// [`crate::utils::client_info::detect`]; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedInfo {
    pub device: String,
    pub os: String,
    pub browser: String,
    pub country: Option<String>,
    pub language: Option<String>,
}

impl DetectedInfo {
    /// Returns the detected value for a target attribute, if known.
    pub fn get(&self, target_type: TargetType) -> Option<&str> {
        match target_type {
            TargetType::Device => Some(self.device.as_str()),
            TargetType::Os => Some(self.os.as_str()),
            TargetType::Browser => Some(self.browser.as_str()),
            TargetType::Country => self.country.as_deref(),
            TargetType::Language => self.language.as_deref(),
        }
    }
}

impl Default for DetectedInfo {
    fn default() -> Self {
        Self {
            device: "desktop".to_string(),
            os: "other".to_string(),
            browser: "other".to_string(),
            country: None,
            language: None,
        }
    }
}
