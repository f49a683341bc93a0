//! Link entity representing a short code mapped to a destination.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a cloaked link is delivered to the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CloakMode {
    Iframe,
    Javascript,
    MetaRefresh,
}

impl CloakMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iframe => "IFRAME",
            Self::Javascript => "JAVASCRIPT",
            Self::MetaRefresh => "META_REFRESH",
        }
    }
}

impl fmt::Display for CloakMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloakMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "IFRAME" => Ok(Self::Iframe),
            "JAVASCRIPT" => Ok(Self::Javascript),
            "META_REFRESH" => Ok(Self::MetaRefresh),
            other => Err(format!("unknown cloak mode: {other}")),
        }
    }
}

/// Cloaking configuration attached to a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloakSettings {
    pub mode: CloakMode,
    pub title: Option<String>,
    pub favicon_url: Option<String>,
}

/// A shortened link.
///
/// `short_code` and `custom_alias` are each globally unique and never change
/// once issued. A link created with an alias carries it in both fields.
/// The resolution path only reads links.
#[derive(Debug, Clone)]
pub struct Link {
    pub id: i64,
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub destination_url: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub owner_id: Option<i64>,
    pub cloak: Option<CloakSettings>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Link {
    /// Returns true if the link has passed its expiry time at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Returns true if the link may resolve to a destination at `now`.
    pub fn is_resolvable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired_at(now)
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub destination_url: String,
    pub owner_id: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub cloak: Option<CloakSettings>,
}
