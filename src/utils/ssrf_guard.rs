//! Server-side request forgery checks for user-supplied outbound URLs.
//!
//! Every destination accepted from a client (link targets, A/B variants,
//! targeting overrides, webhook endpoints) passes through [`check_url`]
//! before it is stored. The checks are literal: the host is inspected as
//! written, no DNS lookup is performed. A public hostname that later
//! resolves to a private address is not caught here.

use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

/// Ports a destination may use. Anything else is rejected.
pub const ALLOWED_PORTS: &[u16] = &[80, 443, 8080, 8443];

/// Hostnames that always point at the local machine or a metadata service.
const BLOCKED_HOSTNAMES: &[&str] = &[
    "localhost",
    "localhost.localdomain",
    "ip6-localhost",
    "ip6-loopback",
    "metadata",
    "metadata.google.internal",
    "instance-data",
    "instance-data.ec2.internal",
];

/// Labels reserved for private networks. Matched against every label of the
/// host, not just the last one.
const INTERNAL_LABELS: &[&str] = &[
    "internal",
    "intranet",
    "corp",
    "local",
    "localdomain",
    "localhost",
    "home",
    "lan",
];

/// Blocked IPv4 networks as `(network, prefix length, description)`.
const BLOCKED_IPV4: &[(u32, u8, &str)] = &[
    (0x0000_0000, 8, "this-network"),
    (0x0A00_0000, 8, "private"),
    (0x6440_0000, 10, "carrier-grade NAT"),
    (0x7F00_0000, 8, "loopback"),
    (0xA9FE_0000, 16, "link-local"),
    (0xAC10_0000, 12, "private"),
    (0xC000_0000, 24, "IETF protocol assignment"),
    (0xC000_0200, 24, "documentation"),
    (0xC0A8_0000, 16, "private"),
    (0xC612_0000, 15, "benchmarking"),
    (0xC633_6400, 24, "documentation"),
    (0xCB00_7100, 24, "documentation"),
    (0xE000_0000, 4, "multicast"),
    (0xF000_0000, 4, "reserved"),
];

/// Blocked IPv6 networks, same layout as [`BLOCKED_IPV4`].
const BLOCKED_IPV6: &[(u128, u8, &str)] = &[
    (0xfc00 << 112, 7, "unique-local"),
    (0xfe80 << 112, 10, "link-local"),
    (0xfec0 << 112, 10, "site-local"),
    (0xff00 << 112, 8, "multicast"),
    (0x2001_0db8 << 96, 32, "documentation"),
];

/// NAT64 well-known prefix `64:ff9b::/96`.
const NAT64_PREFIX: u128 = 0x0064_ff9b << 96;

/// Paths a webhook must never target, matched on the first segment.
const SENSITIVE_SEGMENTS: &[&str] = &["admin", "internal", "metadata", "status", "health"];

const ACME_CHALLENGE_PREFIX: &str = "/.well-known/acme-challenge/";

/// A rejected outbound URL. The display text names the violated rule
/// category first, then the detail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SsrfViolation {
    #[error("invalid: {0}")]
    Invalid(String),

    #[error("protocol: scheme '{0}' is not allowed, use http or https")]
    Protocol(String),

    #[error("credentials: URLs must not embed a username or password")]
    Credentials,

    #[error("hostname: {0}")]
    Hostname(String),

    #[error("port: {0} is not allowed")]
    Port(u16),

    #[error("path: '{0}' is a sensitive path")]
    Path(String),
}

impl SsrfViolation {
    /// Short rule category, suitable for metric labels.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "invalid",
            Self::Protocol(_) => "protocol",
            Self::Credentials => "credentials",
            Self::Hostname(_) => "hostname",
            Self::Port(_) => "port",
            Self::Path(_) => "path",
        }
    }
}

/// Outcome of an SSRF check in report form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsrfCheck {
    pub safe: bool,
    pub reason: Option<String>,
}

impl<T> From<Result<T, SsrfViolation>> for SsrfCheck {
    fn from(result: Result<T, SsrfViolation>) -> Self {
        match result {
            Ok(_) => Self {
                safe: true,
                reason: None,
            },
            Err(violation) => Self {
                safe: false,
                reason: Some(violation.to_string()),
            },
        }
    }
}

/// Reports whether `url` is safe to store as a redirect destination.
pub fn validate_for_ssrf(url: &str) -> SsrfCheck {
    check_url(url).into()
}

/// Reports whether `url` is safe to use as a webhook endpoint.
pub fn validate_webhook_url(url: &str) -> SsrfCheck {
    check_webhook_url(url).into()
}

/// Validates an outbound URL and returns it parsed.
///
/// # Errors
///
/// Returns the first [`SsrfViolation`] found, checked in this order:
/// structure, scheme, credentials, host, port.
pub fn check_url(input: &str) -> Result<Url, SsrfViolation> {
    let url = Url::parse(input).map_err(|e| SsrfViolation::Invalid(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(SsrfViolation::Protocol(other.to_string())),
    }

    if !url.username().is_empty() || url.password().is_some() {
        return Err(SsrfViolation::Credentials);
    }

    match url.host() {
        Some(Host::Ipv4(addr)) => check_ipv4(addr)?,
        Some(Host::Ipv6(addr)) => check_ipv6(addr)?,
        Some(Host::Domain(domain)) => check_hostname(domain)?,
        None => return Err(SsrfViolation::Invalid("URL has no host".to_string())),
    }

    let port = url
        .port_or_known_default()
        .ok_or_else(|| SsrfViolation::Invalid("URL has no port".to_string()))?;
    if !ALLOWED_PORTS.contains(&port) {
        return Err(SsrfViolation::Port(port));
    }

    Ok(url)
}

/// [`check_url`] plus rejection of paths that commonly expose internal
/// control surfaces.
///
/// # Errors
///
/// Returns [`SsrfViolation::Path`] for a sensitive path, otherwise the same
/// errors as [`check_url`].
pub fn check_webhook_url(input: &str) -> Result<Url, SsrfViolation> {
    let url = check_url(input)?;

    if is_sensitive_path(url.path()) {
        return Err(SsrfViolation::Path(url.path().to_string()));
    }

    Ok(url)
}

fn is_sensitive_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();

    if lower.starts_with(ACME_CHALLENGE_PREFIX) {
        return true;
    }

    let first_segment = lower.trim_start_matches('/').split('/').next().unwrap_or("");
    SENSITIVE_SEGMENTS.contains(&first_segment)
}

fn check_ipv4(addr: Ipv4Addr) -> Result<(), SsrfViolation> {
    match blocked_ipv4_range(addr) {
        Some(range) => Err(SsrfViolation::Hostname(format!(
            "{addr} is a {range} address"
        ))),
        None => Ok(()),
    }
}

fn check_ipv6(addr: Ipv6Addr) -> Result<(), SsrfViolation> {
    match blocked_ipv6_range(addr) {
        Some(range) => Err(SsrfViolation::Hostname(format!(
            "{addr} is a {range} address"
        ))),
        None => Ok(()),
    }
}

fn check_hostname(domain: &str) -> Result<(), SsrfViolation> {
    let host = domain.trim_end_matches('.').to_ascii_lowercase();

    if host.is_empty() {
        return Err(SsrfViolation::Invalid("empty hostname".to_string()));
    }

    if BLOCKED_HOSTNAMES.contains(&host.as_str()) {
        return Err(SsrfViolation::Hostname(format!("'{host}' is blocked")));
    }

    if let Some(label) = host.split('.').find(|l| INTERNAL_LABELS.contains(l)) {
        return Err(SsrfViolation::Hostname(format!(
            "'{host}' uses the internal label '{label}'"
        )));
    }

    if let Some(addr) = parse_numeric_ipv4(&host) {
        return check_ipv4(addr);
    }

    Ok(())
}

/// Returns the name of the blocked range containing `addr`, if any.
pub fn blocked_ipv4_range(addr: Ipv4Addr) -> Option<&'static str> {
    let value = u32::from(addr);
    BLOCKED_IPV4
        .iter()
        .find(|(network, prefix, _)| in_prefix_v4(value, *network, *prefix))
        .map(|(_, _, name)| *name)
}

/// Returns the name of the blocked range containing `addr`, if any.
///
/// IPv4-mapped (`::ffff:a.b.c.d`), IPv4-compatible (`::a.b.c.d`) and NAT64
/// (`64:ff9b::a.b.c.d`) forms are judged by their embedded IPv4 address.
pub fn blocked_ipv6_range(addr: Ipv6Addr) -> Option<&'static str> {
    if addr.is_loopback() {
        return Some("loopback");
    }
    if addr.is_unspecified() {
        return Some("unspecified");
    }

    let value = u128::from(addr);

    if let Some(v4) = addr.to_ipv4_mapped() {
        return blocked_ipv4_range(v4);
    }
    if value >> 32 == 0 || in_prefix_v6(value, NAT64_PREFIX, 96) {
        return blocked_ipv4_range(Ipv4Addr::from(value as u32));
    }

    BLOCKED_IPV6
        .iter()
        .find(|(network, prefix, _)| in_prefix_v6(value, *network, *prefix))
        .map(|(_, _, name)| *name)
}

fn in_prefix_v4(value: u32, network: u32, prefix: u8) -> bool {
    let mask = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
    value & mask == network & mask
}

fn in_prefix_v6(value: u128, network: u128, prefix: u8) -> bool {
    let mask = u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0);
    value & mask == network & mask
}

/// Decodes a hostname written as a numeric IPv4 address.
///
/// Accepts the forms `inet_aton` does: one to four dot-separated parts, each
/// decimal, hexadecimal (`0x` prefix) or octal (leading `0`), with the last
/// part filling the remaining bytes. `2130706433`, `0x7f000001`,
/// `0177.0.0.1` and `127.1` all decode to `127.0.0.1`.
pub fn parse_numeric_ipv4(host: &str) -> Option<Ipv4Addr> {
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() {
        return None;
    }

    let parts = host
        .split('.')
        .map(parse_numeric_part)
        .collect::<Option<Vec<u64>>>()?;

    if parts.len() > 4 {
        return None;
    }

    let (last, head) = parts.split_last()?;
    if head.iter().any(|&part| part > 255) {
        return None;
    }

    let tail_bits = 8 * (4 - head.len() as u32);
    if *last >= 1u64 << tail_bits {
        return None;
    }

    let mut value = *last as u32;
    for (index, &part) in head.iter().enumerate() {
        value |= (part as u32) << (24 - 8 * index as u32);
    }

    Some(Ipv4Addr::from(value))
}

fn parse_numeric_part(part: &str) -> Option<u64> {
    let (digits, radix) = if let Some(hex) = part
        .strip_prefix("0x")
        .or_else(|| part.strip_prefix("0X"))
    {
        (hex, 16)
    } else if part.len() > 1 && part.starts_with('0') {
        (&part[1..], 8)
    } else {
        (part, 10)
    };

    if digits.is_empty() {
        // "0x" alone reads as zero; an empty part is not a number.
        return (radix == 16).then_some(0);
    }

    if !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    u64::from_str_radix(digits, radix).ok()
}
