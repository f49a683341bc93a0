//! Click event model for asynchronous click tracking.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A resolution event, produced once per successful redirect.
///
/// Passed from the redirect handler to the background worker through a
/// bounded channel and written once to the click sink. The core never reads
/// it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub link_id: i64,
    /// Variant served when the link is under an A/B test.
    pub variant_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub ip: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub device: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub referrer: Option<String>,
}

impl ClickEvent {
    /// Creates an event for `link_id` stamped with the current time.
    pub fn new(link_id: i64) -> Self {
        Self {
            link_id,
            variant_id: None,
            timestamp: Utc::now(),
            ip: None,
            country: None,
            city: None,
            device: None,
            browser: None,
            os: None,
            referrer: None,
        }
    }
}
