//! Subscription tiers and their experiment ceilings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription tier of a link owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Plan {
    Free,
    Starter,
    Pro,
    Business,
    Enterprise,
}

/// Numeric ceilings for a tier. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    pub max_ab_tests: Option<u32>,
    pub max_variants_per_test: Option<u32>,
}

/// Ceilings per tier, in [`Plan`] declaration order.
const PLAN_LIMITS: [(Plan, PlanLimits); 5] = [
    (
        Plan::Free,
        PlanLimits {
            max_ab_tests: Some(0),
            max_variants_per_test: Some(0),
        },
    ),
    (
        Plan::Starter,
        PlanLimits {
            max_ab_tests: Some(1),
            max_variants_per_test: Some(2),
        },
    ),
    (
        Plan::Pro,
        PlanLimits {
            max_ab_tests: Some(5),
            max_variants_per_test: Some(4),
        },
    ),
    (
        Plan::Business,
        PlanLimits {
            max_ab_tests: Some(20),
            max_variants_per_test: Some(6),
        },
    ),
    (
        Plan::Enterprise,
        PlanLimits {
            max_ab_tests: None,
            max_variants_per_test: None,
        },
    ),
];

impl Plan {
    /// Looks up this tier's ceilings.
    pub fn limits(self) -> PlanLimits {
        PLAN_LIMITS[self as usize].1
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Starter => "STARTER",
            Self::Pro => "PRO",
            Self::Business => "BUSINESS",
            Self::Enterprise => "ENTERPRISE",
        }
    }
}

impl PlanLimits {
    /// Returns true if `current` existing items leave room for one more.
    pub fn allows_another(limit: Option<u32>, current: u64) -> bool {
        limit.is_none_or(|max| current < u64::from(max))
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FREE" => Ok(Self::Free),
            "STARTER" => Ok(Self::Starter),
            "PRO" => Ok(Self::Pro),
            "BUSINESS" => Ok(Self::Business),
            "ENTERPRISE" => Ok(Self::Enterprise),
            other => Err(format!("unknown plan: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_in_declaration_order() {
        for (index, (plan, _)) in PLAN_LIMITS.iter().enumerate() {
            assert_eq!(*plan as usize, index);
        }
    }

    #[test]
    fn test_tier_ceilings() {
        assert_eq!(Plan::Free.limits().max_ab_tests, Some(0));
        assert_eq!(Plan::Free.limits().max_variants_per_test, Some(0));
        assert_eq!(Plan::Starter.limits().max_ab_tests, Some(1));
        assert_eq!(Plan::Starter.limits().max_variants_per_test, Some(2));
        assert_eq!(Plan::Pro.limits().max_ab_tests, Some(5));
        assert_eq!(Plan::Pro.limits().max_variants_per_test, Some(4));
        assert_eq!(Plan::Business.limits().max_ab_tests, Some(20));
        assert_eq!(Plan::Business.limits().max_variants_per_test, Some(6));
        assert_eq!(Plan::Enterprise.limits().max_ab_tests, None);
        assert_eq!(Plan::Enterprise.limits().max_variants_per_test, None);
    }

    #[test]
    fn test_allows_another() {
        assert!(!PlanLimits::allows_another(Some(0), 0));
        assert!(PlanLimits::allows_another(Some(2), 1));
        assert!(!PlanLimits::allows_another(Some(2), 2));
        assert!(PlanLimits::allows_another(None, 10_000));
    }

    #[test]
    fn test_parse_plan() {
        assert_eq!("pro".parse::<Plan>().unwrap(), Plan::Pro);
        assert!("gold".parse::<Plan>().is_err());
    }
}
