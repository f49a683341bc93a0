//! HTML wrappers served in place of a redirect for cloaked links.
//!
//! Every page is rendered from an Askama template under `templates/cloak/`.
//! Templates with an `.html` extension escape every interpolation, so the
//! destination, title and favicon never reach the document raw. Scripts
//! never interpolate values directly; they read the already-escaped `href`
//! of an anchor instead.

use std::time::Duration;

use askama::Template;
use serde_json::json;

use crate::domain::entities::{CloakMode, CloakSettings};
use crate::error::AppError;

/// Title used when the link has none configured.
pub const DEFAULT_TITLE: &str = "Redirecting";

/// Delay before the JAVASCRIPT mode navigates.
const SCRIPT_REDIRECT_DELAY_MS: u64 = 50;

/// Default delay before the IFRAME mode reveals its continue link.
pub const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Template)]
#[template(path = "cloak/iframe.html")]
struct IframePage<'a> {
    destination: &'a str,
    title: &'a str,
    favicon_url: Option<&'a str>,
    fallback_timeout_ms: u64,
}

#[derive(Template)]
#[template(path = "cloak/javascript.html")]
struct JavascriptPage<'a> {
    destination: &'a str,
    title: &'a str,
    favicon_url: Option<&'a str>,
    delay_ms: u64,
}

#[derive(Template)]
#[template(path = "cloak/meta_refresh.html")]
struct MetaRefreshPage<'a> {
    destination: &'a str,
    title: &'a str,
    favicon_url: Option<&'a str>,
}

/// Renders cloaked pages.
#[derive(Debug, Clone, Copy)]
pub struct CloakRenderer {
    fallback_timeout: Duration,
}

impl Default for CloakRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_TIMEOUT)
    }
}

impl CloakRenderer {
    /// `fallback_timeout` is how long the IFRAME mode shows the frame before
    /// revealing a direct link, whether or not the frame loaded.
    pub fn new(fallback_timeout: Duration) -> Self {
        Self { fallback_timeout }
    }

    /// Renders the page for `destination` in the mode given by `settings`.
    ///
    /// A favicon that is not an `http(s)` URL is left out.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if template rendering fails.
    pub fn render(&self, destination: &str, settings: &CloakSettings) -> Result<String, AppError> {
        let title = settings
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE);

        let favicon_url = settings
            .favicon_url
            .as_deref()
            .filter(|f| f.starts_with("https://") || f.starts_with("http://"));

        let rendered = match settings.mode {
            CloakMode::Iframe => IframePage {
                destination,
                title,
                favicon_url,
                fallback_timeout_ms: u64::try_from(self.fallback_timeout.as_millis())
                    .unwrap_or(u64::MAX),
            }
            .render(),
            CloakMode::Javascript => JavascriptPage {
                destination,
                title,
                favicon_url,
                delay_ms: SCRIPT_REDIRECT_DELAY_MS,
            }
            .render(),
            CloakMode::MetaRefresh => MetaRefreshPage {
                destination,
                title,
                favicon_url,
            }
            .render(),
        };

        rendered.map_err(|e| {
            tracing::error!(error = %e, mode = %settings.mode, "Failed to render cloak page");
            AppError::internal("Failed to render page", json!({}))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: [CloakMode; 3] = [CloakMode::Iframe, CloakMode::Javascript, CloakMode::MetaRefresh];

    fn settings(mode: CloakMode, title: Option<&str>) -> CloakSettings {
        CloakSettings {
            mode,
            title: title.map(str::to_string),
            favicon_url: None,
        }
    }

    #[test]
    fn test_script_title_is_escaped_in_every_mode() {
        let renderer = CloakRenderer::default();

        for mode in MODES {
            let html = renderer
                .render(
                    "https://example.com/",
                    &settings(mode, Some("<script>alert(1)</script>")),
                )
                .unwrap();

            assert!(!html.contains("<script>alert(1)</script>"), "{mode}");
            assert!(html.contains("script&"), "{mode}");
        }
    }

    #[test]
    fn test_destination_cannot_break_out_of_attributes() {
        let renderer = CloakRenderer::default();
        let destination = "https://example.com/?q=\"><script>alert(1)</script>";

        for mode in MODES {
            let html = renderer.render(destination, &settings(mode, None)).unwrap();

            assert!(!html.contains("\"><script>"), "{mode}");
            assert!(!html.contains("<script>alert(1)"), "{mode}");
        }
    }

    #[test]
    fn test_favicon_is_escaped_and_scheme_checked() {
        let renderer = CloakRenderer::default();

        let mut s = settings(CloakMode::MetaRefresh, None);
        s.favicon_url = Some("https://cdn.example.com/icon.png?a=1&b=\"2\"".to_string());
        let html = renderer.render("https://example.com/", &s).unwrap();
        assert!(html.contains("rel=\"icon\""));
        assert!(!html.contains("b=\"2\""));

        s.favicon_url = Some("javascript:alert(1)".to_string());
        let html = renderer.render("https://example.com/", &s).unwrap();
        assert!(!html.contains("rel=\"icon\""));
    }

    #[test]
    fn test_meta_refresh_page() {
        let html = CloakRenderer::default()
            .render("https://example.com/page", &settings(CloakMode::MetaRefresh, Some("Hello")))
            .unwrap();

        assert!(html.contains("http-equiv=\"refresh\""));
        assert!(html.contains("<title>Hello</title>"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn test_javascript_page_has_noscript_fallback() {
        let html = CloakRenderer::default()
            .render("https://example.com/page", &settings(CloakMode::Javascript, None))
            .unwrap();

        assert!(html.contains("<noscript><meta http-equiv=\"refresh\""));
        assert!(html.contains("location.replace"));
        assert!(html.contains(&format!("<title>{DEFAULT_TITLE}</title>")));
    }

    #[test]
    fn test_iframe_page_has_timed_fallback() {
        let html = CloakRenderer::new(Duration::from_secs(3))
            .render("https://example.com/page", &settings(CloakMode::Iframe, Some("  ")))
            .unwrap();

        assert!(html.contains("<iframe"));
        assert!(html.contains("setTimeout(showFallback, 3000)"));
        assert!(html.contains("addEventListener(\"error\""));
        assert!(html.contains("Continue to"));
        assert!(html.contains(&format!("<title>{DEFAULT_TITLE}</title>")));
    }

    #[test]
    fn test_iframe_fallback_shown_even_after_frame_load() {
        let html = CloakRenderer::default()
            .render("https://example.com/", &settings(CloakMode::Iframe, None))
            .unwrap();

        assert!(html.contains("function showFallback() { fallback.className = \"visible\"; }"));
        assert!(!html.contains("loaded"));
        assert!(!html.contains("addEventListener(\"load\""));
    }

    #[test]
    fn test_default_fallback_timeout_is_ten_seconds() {
        let html = CloakRenderer::default()
            .render("https://example.com/", &settings(CloakMode::Iframe, None))
            .unwrap();

        assert!(html.contains("setTimeout(showFallback, 10000)"));
    }
}
