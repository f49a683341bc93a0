//! A/B test entities: an experiment over weighted destinations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of an experiment. Only running tests affect redirects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbTestStatus {
    Running,
    Paused,
    Completed,
}

impl AbTestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for AbTestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AbTestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RUNNING" => Ok(Self::Running),
            "PAUSED" => Ok(Self::Paused),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(format!("unknown test status: {other}")),
        }
    }
}

/// An experiment owned by a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbTest {
    pub id: i64,
    pub link_id: i64,
    pub name: String,
    pub status: AbTestStatus,
    pub created_at: DateTime<Utc>,
}

/// One candidate destination of an experiment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbVariant {
    pub id: i64,
    pub test_id: i64,
    pub name: String,
    pub destination_url: String,
    pub weight: u32,
}

/// A running experiment together with its variants, in insertion order.
#[derive(Debug, Clone)]
pub struct RunningTest {
    pub test: AbTest,
    pub variants: Vec<AbVariant>,
}

/// Input data for creating a new experiment.
#[derive(Debug, Clone)]
pub struct NewAbTest {
    pub link_id: i64,
    pub name: String,
}

/// Input data for adding a variant to an experiment.
#[derive(Debug, Clone)]
pub struct NewAbVariant {
    pub test_id: i64,
    pub name: String,
    pub destination_url: String,
    pub weight: u32,
}
