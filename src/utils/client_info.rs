//! Client attribute extraction from request headers.
//!
//! Device, OS and browser come from the `User-Agent` header parsed with
//! woothee and folded into the targeting vocabularies. Country and city are
//! read from headers set by the edge (CDN or load balancer); the service never
//! performs IP geolocation itself.

use axum::http::{HeaderMap, header};
use std::net::{IpAddr, SocketAddr};
use woothee::parser::Parser;

use crate::domain::detected_info::DetectedInfo;

/// Country headers in precedence order.
const COUNTRY_HEADERS: &[&str] = &["cf-ipcountry", "x-vercel-ip-country", "x-country-code"];

/// City headers in precedence order.
const CITY_HEADERS: &[&str] = &["cf-ipcity", "x-vercel-ip-city"];

/// Placeholder country codes edges emit for unknown or Tor traffic.
const UNKNOWN_COUNTRIES: &[&str] = &["XX", "T1"];

const MAX_CITY_LENGTH: usize = 100;

/// Derives [`DetectedInfo`] from request headers.
pub fn detect(headers: &HeaderMap) -> DetectedInfo {
    let user_agent = header_str(headers, header::USER_AGENT.as_str()).unwrap_or("");
    let (device, os, browser) = parse_user_agent(user_agent);

    DetectedInfo {
        device: device.to_string(),
        os: os.to_string(),
        browser: browser.to_string(),
        country: country(headers),
        language: language(headers),
    }
}

/// Returns `(device, os, browser)` for a `User-Agent` string.
pub fn parse_user_agent(user_agent: &str) -> (&'static str, &'static str, &'static str) {
    let parser = Parser::new();
    let result = parser.parse(user_agent).unwrap_or_default();

    let os = match result.os {
        "iPhone" | "iPad" | "iPod" | "iOS" => "ios",
        "Android" => "android",
        "Mac OSX" | "Mac OS Classic" => "macos",
        "Linux" => "linux",
        os if os.starts_with("Windows") && !os.starts_with("Windows Phone") => "windows",
        _ => "other",
    };

    let is_tablet = result.os == "iPad"
        || user_agent.contains("Tablet")
        || (result.os == "Android" && !user_agent.contains("Mobile"));

    let device = if is_tablet {
        "tablet"
    } else if matches!(result.category, "smartphone" | "mobilephone") {
        "mobile"
    } else {
        "desktop"
    };

    let browser = match result.name {
        "Chrome" => "chrome",
        "Safari" => "safari",
        "Firefox" => "firefox",
        "Edge" => "edge",
        "Opera" => "opera",
        "Internet Explorer" => "ie",
        _ => "other",
    };

    (device, os, browser)
}

/// Two-letter uppercase country code from edge headers.
pub fn country(headers: &HeaderMap) -> Option<String> {
    COUNTRY_HEADERS
        .iter()
        .filter_map(|name| header_str(headers, name))
        .map(|value| value.trim().to_ascii_uppercase())
        .find(|code| {
            code.len() == 2
                && code.bytes().all(|b| b.is_ascii_alphabetic())
                && !UNKNOWN_COUNTRIES.contains(&code.as_str())
        })
}

/// City name from edge headers, for click analytics only.
pub fn city(headers: &HeaderMap) -> Option<String> {
    CITY_HEADERS
        .iter()
        .filter_map(|name| header_str(headers, name))
        .map(str::trim)
        .find(|city| !city.is_empty())
        .map(|city| city.chars().take(MAX_CITY_LENGTH).collect())
}

/// Primary language subtag of the first `Accept-Language` entry, lowercase.
///
/// `en-US,en;q=0.9` yields `en`; a wildcard or malformed tag yields `None`.
pub fn language(headers: &HeaderMap) -> Option<String> {
    let raw = header_str(headers, header::ACCEPT_LANGUAGE.as_str())?;
    let first = raw.split(',').next()?.split(';').next()?.trim();
    let primary = first.split(['-', '_']).next()?;

    let valid = (2..=3).contains(&primary.len()) && primary.bytes().all(|b| b.is_ascii_alphabetic());
    valid.then(|| primary.to_ascii_lowercase())
}

/// `Referer` header, if present.
pub fn referrer(headers: &HeaderMap) -> Option<String> {
    header_str(headers, header::REFERER.as_str())
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}

/// Identity of the client for rate limiting and click records.
///
/// When `behind_proxy` is set the first `X-Forwarded-For` hop, then
/// `X-Real-IP`, take precedence over the socket peer. Falls back to
/// `"unknown"` when nothing usable is available.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, behind_proxy: bool) -> String {
    if behind_proxy {
        let forwarded = header_str(headers, "x-forwarded-for")
            .and_then(|value| value.split(',').next())
            .and_then(parse_ip);
        let real_ip = || header_str(headers, "x-real-ip").and_then(parse_ip);

        if let Some(ip) = forwarded.or_else(real_ip) {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    value.trim().parse().ok()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const IPHONE_SAFARI: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const IPAD_SAFARI: &str = "Mozilla/5.0 (iPad; CPU OS 16_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/604.1";
    const WINDOWS_CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const MAC_FIREFOX: &str =
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0";
    const ANDROID_CHROME: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for &(name, value) in pairs {
            map.insert(name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_parse_iphone() {
        assert_eq!(parse_user_agent(IPHONE_SAFARI), ("mobile", "ios", "safari"));
    }

    #[test]
    fn test_parse_ipad_is_tablet() {
        let (device, os, _) = parse_user_agent(IPAD_SAFARI);
        assert_eq!(device, "tablet");
        assert_eq!(os, "ios");
    }

    #[test]
    fn test_parse_desktop_browsers() {
        assert_eq!(parse_user_agent(WINDOWS_CHROME), ("desktop", "windows", "chrome"));
        assert_eq!(parse_user_agent(MAC_FIREFOX), ("desktop", "macos", "firefox"));
    }

    #[test]
    fn test_parse_android_phone() {
        assert_eq!(parse_user_agent(ANDROID_CHROME), ("mobile", "android", "chrome"));
    }

    #[test]
    fn test_parse_unknown_agent_defaults() {
        assert_eq!(parse_user_agent(""), ("desktop", "other", "other"));
        assert_eq!(parse_user_agent("curl/8.4.0").1, "other");
    }

    #[test]
    fn test_detect_without_headers_matches_default() {
        assert_eq!(detect(&HeaderMap::new()), DetectedInfo::default());
    }

    #[test]
    fn test_detect_full() {
        let info = detect(&headers(&[
            ("user-agent", IPHONE_SAFARI),
            ("cf-ipcountry", "de"),
            ("accept-language", "de-DE,de;q=0.9,en;q=0.8"),
        ]));

        assert_eq!(info.device, "mobile");
        assert_eq!(info.country.as_deref(), Some("DE"));
        assert_eq!(info.language.as_deref(), Some("de"));
    }

    #[test]
    fn test_country_header_precedence_and_validation() {
        let h = headers(&[("cf-ipcountry", "XX"), ("x-vercel-ip-country", "fr")]);
        assert_eq!(country(&h).as_deref(), Some("FR"));

        assert_eq!(country(&headers(&[("cf-ipcountry", "T1")])), None);
        assert_eq!(country(&headers(&[("x-country-code", "USA")])), None);
        assert_eq!(country(&headers(&[("x-country-code", "1A")])), None);
        assert_eq!(country(&HeaderMap::new()), None);
    }

    #[test]
    fn test_city() {
        assert_eq!(
            city(&headers(&[("cf-ipcity", " Berlin ")])).as_deref(),
            Some("Berlin")
        );
        assert_eq!(city(&headers(&[("cf-ipcity", "  ")])), None);
    }

    #[test]
    fn test_language_parsing() {
        let lang = |v: &'static str| language(&headers(&[("accept-language", v)]));

        assert_eq!(lang("en-US,en;q=0.9").as_deref(), Some("en"));
        assert_eq!(lang("FR").as_deref(), Some("fr"));
        assert_eq!(lang("fil-PH").as_deref(), Some("fil"));
        assert_eq!(lang("zh_CN").as_deref(), Some("zh"));
        assert_eq!(lang("*"), None);
        assert_eq!(lang("english"), None);
        assert_eq!(lang(""), None);
    }

    #[test]
    fn test_client_ip_direct() {
        let peer: SocketAddr = "203.0.113.5:4000".parse().unwrap();
        let h = headers(&[("x-forwarded-for", "198.51.100.1")]);

        assert_eq!(client_ip(&h, Some(peer), false), "203.0.113.5");
    }

    #[test]
    fn test_client_ip_behind_proxy() {
        let peer: SocketAddr = "10.0.0.2:4000".parse().unwrap();

        let h = headers(&[("x-forwarded-for", "198.51.100.1, 10.0.0.1")]);
        assert_eq!(client_ip(&h, Some(peer), true), "198.51.100.1");

        let h = headers(&[("x-real-ip", "198.51.100.9")]);
        assert_eq!(client_ip(&h, Some(peer), true), "198.51.100.9");

        let h = headers(&[("x-forwarded-for", "garbage")]);
        assert_eq!(client_ip(&h, Some(peer), true), "10.0.0.2");
    }

    #[test]
    fn test_client_ip_unknown() {
        assert_eq!(client_ip(&HeaderMap::new(), None, true), "unknown");
    }

    #[test]
    fn test_referrer() {
        assert_eq!(
            referrer(&headers(&[("referer", "https://news.example.com/")])).as_deref(),
            Some("https://news.example.com/")
        );
        assert_eq!(referrer(&HeaderMap::new()), None);
    }
}
