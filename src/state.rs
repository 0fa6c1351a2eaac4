//! Shared application state injected into every handler.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::application::services::{LinkService, StatsService};
use crate::domain::click_worker::ClickRecorder;
use crate::domain::rate_limiter::RateLimiters;
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::infrastructure::cache::CacheService;

/// Link service over type-erased repositories.
pub type DynLinkService = LinkService<dyn LinkRepository, dyn ClickRepository>;

/// Stats service over type-erased repositories.
pub type DynStatsService = StatsService<dyn LinkRepository, dyn ClickRepository>;

/// Request-independent settings carried in [`AppState`].
#[derive(Debug, Clone)]
pub struct StateSettings {
    /// Public prefix for short URLs; `None` derives it from the `Host` header.
    pub base_url: Option<String>,
    pub behind_proxy: bool,
    pub cache_ttl: Duration,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            behind_proxy: false,
            cache_ttl: crate::application::services::link_service::DEFAULT_CACHE_TTL,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<DynLinkService>,
    pub stats_service: Arc<DynStatsService>,
    pub link_repository: Arc<dyn LinkRepository>,
    pub cache: Arc<dyn CacheService>,
    pub click_recorder: ClickRecorder,
    pub rate_limiters: RateLimiters,
    pub base_url: Option<String>,
    pub behind_proxy: bool,
    pub started_at: Instant,
}

impl AppState {
    /// Wires services from repositories, cache and click pipeline.
    pub fn new(
        link_repository: Arc<dyn LinkRepository>,
        click_repository: Arc<dyn ClickRepository>,
        cache: Arc<dyn CacheService>,
        click_recorder: ClickRecorder,
        rate_limiters: RateLimiters,
        settings: StateSettings,
    ) -> Self {
        let link_service = LinkService::new(
            link_repository.clone(),
            click_repository.clone(),
            cache.clone(),
            click_recorder.clone(),
        )
        .with_cache_ttl(settings.cache_ttl);

        let stats_service = StatsService::new(link_repository.clone(), click_repository);

        Self {
            link_service: Arc::new(link_service),
            stats_service: Arc::new(stats_service),
            link_repository,
            cache,
            click_recorder,
            rate_limiters,
            base_url: settings.base_url,
            behind_proxy: settings.behind_proxy,
            started_at: Instant::now(),
        }
    }
}
