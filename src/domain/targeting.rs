//! Priority-ordered matching of client attributes against link targets.
//!
//! Resolution is first-match only: active targets are ordered by descending
//! priority (ties keep their stored order) and the first one whose value
//! equals the detected attribute wins. There is no partial matching or
//! scoring; when nothing matches the link's own destination is used.

use crate::domain::detected_info::DetectedInfo;
use crate::domain::entities::{Target, TargetType};

/// Returns true if `target` applies to a client described by `detected`.
///
/// Inactive targets never match, and neither does an attribute the request
/// did not reveal (an unknown country never matches a COUNTRY target).
/// Comparison is exact and case-insensitive.
pub fn matches_target(target: &Target, detected: &DetectedInfo) -> bool {
    if !target.is_active {
        return false;
    }

    let Some(actual) = detected.get(target.target_type) else {
        return false;
    };

    match target.target_type {
        TargetType::Country => actual.to_ascii_uppercase() == target.value.to_ascii_uppercase(),
        _ => actual.to_ascii_lowercase() == target.value.to_ascii_lowercase(),
    }
}

/// Returns the highest-priority active target matching `detected`.
pub fn find_matching_target<'a>(
    targets: &'a [Target],
    detected: &DetectedInfo,
) -> Option<&'a Target> {
    let mut active: Vec<&Target> = targets.iter().filter(|t| t.is_active).collect();
    // `sort_by` is stable, so equal priorities keep their stored order.
    active.sort_by(|a, b| b.priority.cmp(&a.priority));

    active
        .into_iter()
        .find(|target| matches_target(target, detected))
}

/// Returns the matched target's destination, or `original_url` unchanged.
pub fn get_target_url<'a>(
    original_url: &'a str,
    targets: &'a [Target],
    detected: &DetectedInfo,
) -> &'a str {
    find_matching_target(targets, detected)
        .map(|t| t.destination_url.as_str())
        .unwrap_or(original_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn target(id: i64, target_type: TargetType, value: &str, priority: i32, active: bool) -> Target {
        Target {
            id,
            link_id: 1,
            target_type,
            value: value.to_string(),
            destination_url: format!("https://example.com/t{id}"),
            priority,
            is_active: active,
            created_at: Utc::now(),
        }
    }

    fn detected() -> DetectedInfo {
        DetectedInfo {
            device: "mobile".to_string(),
            os: "ios".to_string(),
            browser: "safari".to_string(),
            country: Some("US".to_string()),
            language: Some("en".to_string()),
        }
    }

    #[test]
    fn test_matches_case_insensitively() {
        let t = target(1, TargetType::Device, "MOBILE", 0, true);
        assert!(matches_target(&t, &detected()));

        let t = target(2, TargetType::Country, "us", 0, true);
        assert!(matches_target(&t, &detected()));

        let t = target(3, TargetType::Language, "EN", 0, true);
        assert!(matches_target(&t, &detected()));
    }

    #[test]
    fn test_inactive_target_never_matches() {
        let t = target(1, TargetType::Os, "ios", 10, false);
        assert!(!matches_target(&t, &detected()));
    }

    #[test]
    fn test_unknown_country_never_matches() {
        let mut info = detected();
        info.country = None;

        let t = target(1, TargetType::Country, "US", 0, true);
        assert!(!matches_target(&t, &info));
    }

    #[test]
    fn test_unknown_language_never_matches() {
        let mut info = detected();
        info.language = None;

        let t = target(1, TargetType::Language, "en", 0, true);
        assert!(!matches_target(&t, &info));
    }

    #[test]
    fn test_no_prefix_matching() {
        let t = target(1, TargetType::Language, "e", 0, true);
        assert!(!matches_target(&t, &detected()));
    }

    #[test]
    fn test_higher_priority_wins() {
        let targets = vec![
            target(1, TargetType::Device, "mobile", 1, true),
            target(2, TargetType::Country, "US", 2, true),
        ];

        let found = find_matching_target(&targets, &detected()).unwrap();
        assert_eq!(found.id, 2);
    }

    #[test]
    fn test_inactive_matching_target_is_skipped() {
        let targets = vec![
            target(1, TargetType::Device, "mobile", 100, false),
            target(2, TargetType::Browser, "safari", 1, true),
        ];

        let found = find_matching_target(&targets, &detected()).unwrap();
        assert_eq!(found.id, 2);
    }

    #[test]
    fn test_equal_priority_keeps_stored_order() {
        let targets = vec![
            target(7, TargetType::Os, "ios", 5, true),
            target(3, TargetType::Device, "mobile", 5, true),
        ];

        let found = find_matching_target(&targets, &detected()).unwrap();
        assert_eq!(found.id, 7);
    }

    #[test]
    fn test_non_matching_higher_priority_falls_through() {
        let targets = vec![
            target(1, TargetType::Country, "DE", 10, true),
            target(2, TargetType::Device, "mobile", 1, true),
        ];

        let found = find_matching_target(&targets, &detected()).unwrap();
        assert_eq!(found.id, 2);
    }

    #[test]
    fn test_no_match_returns_none() {
        let targets = vec![target(1, TargetType::Country, "FR", 1, true)];
        assert!(find_matching_target(&targets, &detected()).is_none());
        assert!(find_matching_target(&[], &detected()).is_none());
    }

    #[test]
    fn test_get_target_url_falls_back_to_original() {
        let targets = vec![target(1, TargetType::Browser, "firefox", 1, true)];
        assert_eq!(
            get_target_url("https://example.com/page", &targets, &detected()),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_get_target_url_uses_match() {
        let targets = vec![target(4, TargetType::Os, "ios", 1, true)];
        assert_eq!(
            get_target_url("https://example.com/page", &targets, &detected()),
            "https://example.com/t4"
        );
    }
}
