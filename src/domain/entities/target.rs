//! Target entity: a conditional override destination for a link.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Device classes a DEVICE target may name.
pub const DEVICE_VALUES: &[&str] = &["mobile", "tablet", "desktop"];

/// Operating systems an OS target may name.
pub const OS_VALUES: &[&str] = &["ios", "android", "windows", "macos", "linux", "other"];

/// Browsers a BROWSER target may name.
pub const BROWSER_VALUES: &[&str] = &["chrome", "safari", "firefox", "edge", "opera", "ie", "other"];

/// Client attribute a target is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    Device,
    Os,
    Browser,
    Country,
    Language,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Device => "DEVICE",
            Self::Os => "OS",
            Self::Browser => "BROWSER",
            Self::Country => "COUNTRY",
            Self::Language => "LANGUAGE",
        }
    }

    /// Checks that `value` is meaningful for this attribute.
    ///
    /// DEVICE, OS and BROWSER take a value from a fixed vocabulary (any case).
    /// COUNTRY takes a two-letter code, LANGUAGE a two- or three-letter code.
    pub fn validate_value(&self, value: &str) -> Result<(), String> {
        let allowed = match self {
            Self::Device => Some(DEVICE_VALUES),
            Self::Os => Some(OS_VALUES),
            Self::Browser => Some(BROWSER_VALUES),
            Self::Country | Self::Language => None,
        };

        if let Some(allowed) = allowed {
            let lowered = value.to_ascii_lowercase();
            return if allowed.contains(&lowered.as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "{} target value must be one of: {}",
                    self.as_str(),
                    allowed.join(", ")
                ))
            };
        }

        let (min, max) = match self {
            Self::Country => (2, 2),
            _ => (2, 3),
        };
        let letters_only = value.chars().all(|c| c.is_ascii_alphabetic());

        if letters_only && (min..=max).contains(&value.len()) {
            Ok(())
        } else if min == max {
            Err(format!("{} target value must be a {min}-letter code", self.as_str()))
        } else {
            Err(format!(
                "{} target value must be a {min}-{max} letter code",
                self.as_str()
            ))
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEVICE" => Ok(Self::Device),
            "OS" => Ok(Self::Os),
            "BROWSER" => Ok(Self::Browser),
            "COUNTRY" => Ok(Self::Country),
            "LANGUAGE" => Ok(Self::Language),
            other => Err(format!("unknown target type: {other}")),
        }
    }
}

/// A priority-ordered override destination belonging to exactly one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: i64,
    pub link_id: i64,
    pub target_type: TargetType,
    pub value: String,
    pub destination_url: String,
    pub priority: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input data for creating a new target.
#[derive(Debug, Clone)]
pub struct NewTarget {
    pub link_id: i64,
    pub target_type: TargetType,
    pub value: String,
    pub destination_url: String,
    pub priority: i32,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerated_values_accept_any_case() {
        assert!(TargetType::Device.validate_value("Mobile").is_ok());
        assert!(TargetType::Os.validate_value("iOS").is_ok());
        assert!(TargetType::Browser.validate_value("FIREFOX").is_ok());
    }

    #[test]
    fn test_enumerated_values_reject_unknown() {
        assert!(TargetType::Device.validate_value("watch").is_err());
        assert!(TargetType::Os.validate_value("beos").is_err());
        assert!(TargetType::Browser.validate_value("netscape").is_err());
    }

    #[test]
    fn test_country_requires_two_letters() {
        assert!(TargetType::Country.validate_value("US").is_ok());
        assert!(TargetType::Country.validate_value("de").is_ok());
        assert!(TargetType::Country.validate_value("USA").is_err());
        assert!(TargetType::Country.validate_value("U1").is_err());
        assert!(TargetType::Country.validate_value("").is_err());
    }

    #[test]
    fn test_language_accepts_two_or_three_letters() {
        assert!(TargetType::Language.validate_value("en").is_ok());
        assert!(TargetType::Language.validate_value("fil").is_ok());
        assert!(TargetType::Language.validate_value("e").is_err());
        assert!(TargetType::Language.validate_value("engl").is_err());
        assert!(TargetType::Language.validate_value("en-US").is_err());
    }

    #[test]
    fn test_target_type_parse() {
        assert_eq!("country".parse::<TargetType>().unwrap(), TargetType::Country);
        assert_eq!("OS".parse::<TargetType>().unwrap(), TargetType::Os);
        assert!("city".parse::<TargetType>().is_err());
    }
}
