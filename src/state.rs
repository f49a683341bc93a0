//! Shared application state injected into every handler.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::application::services::{
    AdmissionController, LinkService, RateLimitPolicy, RedirectService,
};
use crate::config::Config;
use crate::domain::ab_selection::{EntropySource, ThreadEntropy};
use crate::domain::click_recorder::ClickRecorder;
use crate::domain::repositories::{
    AbTestRepository, ClickRepository, LinkRepository, TargetRepository,
};
use crate::infrastructure::persistence::{
    MemoryStore, PgAbTestRepository, PgClickRepository, PgLinkRepository, PgTargetRepository,
};
use crate::utils::code_generator::DEFAULT_CODE_LENGTH;
use crate::web::cloak::{CloakRenderer, DEFAULT_FALLBACK_TIMEOUT};

/// Storage backends behind the services.
#[derive(Clone)]
pub struct Repositories {
    pub links: Arc<dyn LinkRepository>,
    pub targets: Arc<dyn TargetRepository>,
    pub ab_tests: Arc<dyn AbTestRepository>,
    pub clicks: Arc<dyn ClickRepository>,
}

impl Repositories {
    pub fn postgres(pool: Arc<PgPool>) -> Self {
        Self {
            links: Arc::new(PgLinkRepository::new(pool.clone())),
            targets: Arc::new(PgTargetRepository::new(pool.clone())),
            ab_tests: Arc::new(PgAbTestRepository::new(pool.clone())),
            clicks: Arc::new(PgClickRepository::new(pool)),
        }
    }

    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            links: store.clone(),
            targets: store.clone(),
            ab_tests: store.clone(),
            clicks: store,
        }
    }
}

/// Per-deployment knobs the handlers need.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    /// Trust `X-Forwarded-For` / `X-Real-IP` for the client identity.
    pub behind_proxy: bool,
    pub code_length: usize,
    pub shorten_policy: RateLimitPolicy,
    pub redirect_policy: RateLimitPolicy,
    pub cloak_fallback_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            behind_proxy: false,
            code_length: DEFAULT_CODE_LENGTH,
            shorten_policy: RateLimitPolicy::new("shorten", 20, Duration::from_secs(60)),
            redirect_policy: RateLimitPolicy::new("redirect", 300, Duration::from_secs(60)),
            cloak_fallback_timeout: DEFAULT_FALLBACK_TIMEOUT,
        }
    }
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            behind_proxy: config.behind_proxy,
            code_length: config.short_code_length,
            shorten_policy: RateLimitPolicy::new(
                "shorten",
                config.shorten_rate_limit,
                Duration::from_secs(config.shorten_rate_window_secs),
            ),
            redirect_policy: RateLimitPolicy::new(
                "redirect",
                config.redirect_rate_limit,
                Duration::from_secs(config.redirect_rate_window_secs),
            ),
            cloak_fallback_timeout: Duration::from_secs(config.cloak_fallback_timeout_secs),
        }
    }
}

pub type DynRedirectService =
    RedirectService<dyn LinkRepository, dyn TargetRepository, dyn AbTestRepository>;

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<dyn LinkRepository>>,
    pub redirect_service: Arc<DynRedirectService>,
    pub admission: Arc<AdmissionController>,
    pub click_recorder: ClickRecorder,
    pub cloak_renderer: CloakRenderer,
    pub repositories: Repositories,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        repositories: Repositories,
        admission: Arc<AdmissionController>,
        click_recorder: ClickRecorder,
        settings: Settings,
    ) -> Self {
        Self::with_entropy(
            repositories,
            admission,
            click_recorder,
            settings,
            Arc::new(ThreadEntropy),
        )
    }

    /// Same as [`Self::new`] with a caller-supplied random source for
    /// variant selection.
    pub fn with_entropy(
        repositories: Repositories,
        admission: Arc<AdmissionController>,
        click_recorder: ClickRecorder,
        settings: Settings,
        entropy: Arc<dyn EntropySource>,
    ) -> Self {
        let link_service = Arc::new(LinkService::new(
            repositories.links.clone(),
            settings.code_length,
        ));

        let redirect_service = Arc::new(RedirectService::new(
            repositories.links.clone(),
            repositories.targets.clone(),
            repositories.ab_tests.clone(),
            entropy,
        ));

        Self {
            link_service,
            redirect_service,
            admission,
            click_recorder,
            cloak_renderer: CloakRenderer::new(settings.cloak_fallback_timeout),
            repositories,
            settings: Arc::new(settings),
        }
    }
}
