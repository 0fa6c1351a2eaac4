//! Short link creation and cache-aside resolution.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::click_event::ClickEvent;
use crate::domain::click_worker::ClickRecorder;
use crate::domain::entities::{NewLink, ShortLink};
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::{
    DEFAULT_CODE_LENGTH, generate_code_with_length, validate_custom_code,
};
use crate::utils::url_normalizer::normalize_url;
use serde_json::json;
use tracing::{debug, warn};

/// Default expiry of cached code → URL mappings.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Attempts per code length before moving to a longer code.
const ATTEMPTS_PER_LENGTH: usize = 8;

/// Lengths tried in order when generating a code.
const CODE_LENGTHS: [usize; 3] = [
    DEFAULT_CODE_LENGTH,
    DEFAULT_CODE_LENGTH + 1,
    DEFAULT_CODE_LENGTH + 2,
];

/// First path segments served by fixed routes; a link under one of these
/// codes could never redirect.
const RESERVED_CODES: [&str; 4] = ["admin", "api", "health", "static"];

fn is_reserved_code(code: &str) -> bool {
    RESERVED_CODES.contains(&code)
}

/// Result of a create request.
#[derive(Debug, Clone)]
pub struct ShortenOutcome {
    pub link: ShortLink,
    pub click_count: i64,
    /// `false` when an existing link for the same URL was returned.
    pub created: bool,
}

/// Request metadata attached to a click.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo<'a> {
    pub ip_address: &'a str,
    pub user_agent: Option<&'a str>,
    pub referer: Option<&'a str>,
}

/// Service for creating and resolving shortened links.
///
/// Creation writes to the store first and then to the cache. Resolution
/// reads the cache first and falls back to the store, then hands a click
/// event to the [`ClickRecorder`] without waiting for it.
pub struct LinkService<L: LinkRepository + ?Sized, C: ClickRepository + ?Sized> {
    link_repository: Arc<L>,
    click_repository: Arc<C>,
    cache: Arc<dyn CacheService>,
    click_recorder: ClickRecorder,
    cache_ttl: Duration,
}

impl<L: LinkRepository + ?Sized, C: ClickRepository + ?Sized> LinkService<L, C> {
    /// Creates a new link service.
    pub fn new(
        link_repository: Arc<L>,
        click_repository: Arc<C>,
        cache: Arc<dyn CacheService>,
        click_recorder: ClickRecorder,
    ) -> Self {
        Self {
            link_repository,
            click_repository,
            cache,
            click_recorder,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Overrides the cache expiry.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Creates a short link, or returns the existing one for the same URL.
    ///
    /// # Deduplication
    ///
    /// The URL is normalized first; a known normalized URL returns its link
    /// and current click count with `created = false`, regardless of
    /// `custom_code`.
    ///
    /// # Code Allocation
    ///
    /// - A custom code is validated and must be free
    /// - Otherwise random codes are tried, 8 attempts each at lengths 6, 7 and 8
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL or custom code is malformed.
    /// Returns [`AppError::Conflict`] if the custom code is already taken.
    /// Returns [`AppError::Internal`] if no free code was found or the store fails.
    pub async fn create_short_link(
        &self,
        url: &str,
        custom_code: Option<&str>,
    ) -> Result<ShortenOutcome, AppError> {
        let normalized_url = normalize_url(url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        if let Some(existing) = self.link_repository.find_by_url(&normalized_url).await? {
            let click_count = self.click_repository.count_for_link(existing.id).await?;
            return Ok(ShortenOutcome {
                link: existing,
                click_count,
                created: false,
            });
        }

        let link = match custom_code {
            Some(custom) => self.create_with_custom_code(normalized_url, custom).await?,
            None => self.create_with_generated_code(normalized_url).await?,
        };

        self.cache_mapping(&link.short_code, &link.original_url).await;

        Ok(ShortenOutcome {
            link,
            click_count: 0,
            created: true,
        })
    }

    /// Resolves a short code to its original URL and schedules a click record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this code.
    /// Returns [`AppError::Internal`] if the store fails on a cache miss.
    pub async fn resolve_short_link(
        &self,
        code: &str,
        client: ClientInfo<'_>,
    ) -> Result<String, AppError> {
        let (original_url, link_id) = match self.cache.get(code).await {
            Ok(Some(url)) => {
                metrics::counter!("cache_hits_total").increment(1);
                let link_id = match self.link_repository.find_by_code(code).await {
                    Ok(link) => link.map(|l| l.id),
                    Err(e) => {
                        warn!("Link lookup for click attribution failed ({}): {}", code, e);
                        None
                    }
                };
                (url, link_id)
            }
            _ => {
                metrics::counter!("cache_misses_total").increment(1);
                let link = self
                    .link_repository
                    .find_by_code(code)
                    .await?
                    .ok_or_else(|| {
                        debug!("Short code not found: {}", code);
                        AppError::not_found("Short link not found", json!({ "code": code }))
                    })?;

                self.cache_mapping(&link.short_code, &link.original_url).await;
                (link.original_url, Some(link.id))
            }
        };

        self.click_recorder.record(ClickEvent::new(
            link_id,
            client.ip_address,
            client.user_agent,
            client.referer,
        ));

        Ok(original_url)
    }

    /// Retrieves a link by its short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link matches the code.
    pub async fn get_link_by_code(&self, code: &str) -> Result<ShortLink, AppError> {
        self.link_repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "code": code })))
    }

    async fn create_with_custom_code(
        &self,
        original_url: String,
        custom: &str,
    ) -> Result<ShortLink, AppError> {
        validate_custom_code(custom)?;

        let conflict = || {
            AppError::conflict("Custom code already exists", json!({ "code": custom }))
        };

        if is_reserved_code(custom) || self.link_repository.code_exists(custom).await? {
            return Err(conflict());
        }

        let new_link = NewLink {
            original_url,
            short_code: custom.to_string(),
            title: None,
        };

        match self.link_repository.create(new_link).await {
            Err(AppError::Conflict { .. }) => Err(conflict()),
            other => other,
        }
    }

    async fn create_with_generated_code(
        &self,
        original_url: String,
    ) -> Result<ShortLink, AppError> {
        for length in CODE_LENGTHS {
            for _ in 0..ATTEMPTS_PER_LENGTH {
                let code = generate_code_with_length(length);

                if is_reserved_code(&code) || self.link_repository.code_exists(&code).await? {
                    continue;
                }

                let new_link = NewLink {
                    original_url: original_url.clone(),
                    short_code: code,
                    title: None,
                };

                match self.link_repository.create(new_link).await {
                    // Lost a race for the same code; draw again.
                    Err(AppError::Conflict { .. }) => continue,
                    other => return other,
                }
            }

            debug!("No free code of length {} after {} attempts", length, ATTEMPTS_PER_LENGTH);
        }

        Err(AppError::internal(
            "Failed to generate unique code",
            json!({ "reason": "Too many collisions" }),
        ))
    }

    async fn cache_mapping(&self, code: &str, original_url: &str) {
        if let Err(e) = self
            .cache
            .set(code, original_url, Some(self.cache_ttl))
            .await
        {
            warn!("Failed to cache {}: {}", code, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{MockClickRepository, MockLinkRepository};
    use crate::infrastructure::cache::{MockCacheService, NullCache};
    use chrono::Utc;
    use tokio::sync::mpsc;

    fn create_test_link(id: i64, code: &str, url: &str) -> ShortLink {
        ShortLink::new(id, url.to_string(), code.to_string(), None, Utc::now())
    }

    fn service(
        links: MockLinkRepository,
        clicks: MockClickRepository,
        cache: Arc<dyn CacheService>,
    ) -> (
        LinkService<MockLinkRepository, MockClickRepository>,
        mpsc::Receiver<ClickEvent>,
    ) {
        let (recorder, rx) = ClickRecorder::channel(16);
        let service = LinkService::new(Arc::new(links), Arc::new(clicks), cache, recorder);
        (service, rx)
    }

    fn client() -> ClientInfo<'static> {
        ClientInfo {
            ip_address: "203.0.113.9",
            user_agent: Some("curl/8.0"),
            referer: None,
        }
    }

    #[tokio::test]
    async fn test_create_short_link_success() {
        let mut links = MockLinkRepository::new();
        links
            .expect_find_by_url()
            .withf(|url| url == "http://example.com/page")
            .times(1)
            .returning(|_| Ok(None));
        links.expect_code_exists().times(1).returning(|_| Ok(false));
        links
            .expect_create()
            .withf(|n| n.original_url == "http://example.com/page" && n.short_code.len() == 6)
            .times(1)
            .returning(|n| Ok(create_test_link(10, &n.short_code, &n.original_url)));

        let mut cache = MockCacheService::new();
        cache
            .expect_set()
            .withf(|_, url, ttl| {
                url == "http://example.com/page" && *ttl == Some(DEFAULT_CACHE_TTL)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let (service, _rx) = service(links, MockClickRepository::new(), Arc::new(cache));

        let outcome = service
            .create_short_link("example.com/page", None)
            .await
            .unwrap();

        assert!(outcome.created);
        assert_eq!(outcome.click_count, 0);
        assert_eq!(outcome.link.original_url, "http://example.com/page");
    }

    #[tokio::test]
    async fn test_create_short_link_deduplication() {
        let mut links = MockLinkRepository::new();
        let existing = create_test_link(5, "abc123", "http://example.com/page");
        links
            .expect_find_by_url()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        links.expect_create().times(0);

        let mut clicks = MockClickRepository::new();
        clicks
            .expect_count_for_link()
            .withf(|id| *id == 5)
            .times(1)
            .returning(|_| Ok(7));

        let (service, _rx) = service(links, clicks, Arc::new(NullCache::new()));

        let outcome = service
            .create_short_link("example.com/page", Some("ignored"))
            .await
            .unwrap();

        assert!(!outcome.created);
        assert_eq!(outcome.link.short_code, "abc123");
        assert_eq!(outcome.click_count, 7);
    }

    #[tokio::test]
    async fn test_create_short_link_invalid_url() {
        let (service, _rx) = service(
            MockLinkRepository::new(),
            MockClickRepository::new(),
            Arc::new(NullCache::new()),
        );

        let result = service.create_short_link("http://exa mple.com", None).await;

        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_short_link_with_custom_code() {
        let mut links = MockLinkRepository::new();
        links.expect_find_by_url().times(1).returning(|_| Ok(None));
        links
            .expect_code_exists()
            .withf(|code| code == "my-link")
            .times(1)
            .returning(|_| Ok(false));
        links
            .expect_create()
            .withf(|n| n.short_code == "my-link")
            .times(1)
            .returning(|n| Ok(create_test_link(10, &n.short_code, &n.original_url)));

        let (service, _rx) = service(links, MockClickRepository::new(), Arc::new(NullCache::new()));

        let outcome = service
            .create_short_link("https://example.com", Some("my-link"))
            .await
            .unwrap();

        assert_eq!(outcome.link.short_code, "my-link");
    }

    #[tokio::test]
    async fn test_create_short_link_invalid_custom_code() {
        let mut links = MockLinkRepository::new();
        links.expect_find_by_url().times(1).returning(|_| Ok(None));
        links.expect_create().times(0);

        let (service, _rx) = service(links, MockClickRepository::new(), Arc::new(NullCache::new()));

        let result = service
            .create_short_link("https://example.com", Some("my_link"))
            .await;

        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_short_link_custom_code_conflict() {
        let mut links = MockLinkRepository::new();
        links.expect_find_by_url().times(1).returning(|_| Ok(None));
        links.expect_code_exists().times(1).returning(|_| Ok(true));
        links.expect_create().times(0);

        let (service, _rx) = service(links, MockClickRepository::new(), Arc::new(NullCache::new()));

        let err = service
            .create_short_link("https://other.com", Some("my-link"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
        assert_eq!(err.to_string(), "Custom code already exists");
    }

    #[tokio::test]
    async fn test_create_short_link_reserved_custom_code_conflicts() {
        let mut links = MockLinkRepository::new();
        links.expect_find_by_url().returning(|_| Ok(None));
        links.expect_code_exists().times(0);
        links.expect_create().times(0);

        let (service, _rx) = service(links, MockClickRepository::new(), Arc::new(NullCache::new()));

        for code in ["health", "static", "admin", "api"] {
            let err = service
                .create_short_link("https://example.com", Some(code))
                .await
                .unwrap_err();

            assert!(matches!(err, AppError::Conflict { .. }), "code {code:?}");
        }
    }

    #[tokio::test]
    async fn test_generated_code_grows_after_collisions() {
        let mut links = MockLinkRepository::new();
        links.expect_find_by_url().times(1).returning(|_| Ok(None));
        links
            .expect_code_exists()
            .withf(|code| code.len() == 6)
            .times(ATTEMPTS_PER_LENGTH)
            .returning(|_| Ok(true));
        links
            .expect_code_exists()
            .withf(|code| code.len() == 7)
            .times(1)
            .returning(|_| Ok(false));
        links
            .expect_create()
            .times(1)
            .returning(|n| Ok(create_test_link(1, &n.short_code, &n.original_url)));

        let (service, _rx) = service(links, MockClickRepository::new(), Arc::new(NullCache::new()));

        let outcome = service
            .create_short_link("https://example.com", None)
            .await
            .unwrap();

        assert_eq!(outcome.link.short_code.len(), 7);
    }

    #[tokio::test]
    async fn test_generated_code_exhaustion_is_internal_error() {
        let mut links = MockLinkRepository::new();
        links.expect_find_by_url().times(1).returning(|_| Ok(None));
        links
            .expect_code_exists()
            .times(ATTEMPTS_PER_LENGTH * CODE_LENGTHS.len())
            .returning(|_| Ok(true));
        links.expect_create().times(0);

        let (service, _rx) = service(links, MockClickRepository::new(), Arc::new(NullCache::new()));

        let result = service.create_short_link("https://example.com", None).await;

        assert!(matches!(result.unwrap_err(), AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_generated_code_retries_on_insert_conflict() {
        let mut links = MockLinkRepository::new();
        links.expect_find_by_url().times(1).returning(|_| Ok(None));
        links.expect_code_exists().times(2).returning(|_| Ok(false));

        let mut seq = mockall::Sequence::new();
        links
            .expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::conflict("Unique constraint violation", json!({}))));
        links
            .expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|n| Ok(create_test_link(2, &n.short_code, &n.original_url)));

        let (service, _rx) = service(links, MockClickRepository::new(), Arc::new(NullCache::new()));

        let outcome = service
            .create_short_link("https://example.com", None)
            .await
            .unwrap();

        assert_eq!(outcome.link.id, 2);
    }

    #[tokio::test]
    async fn test_resolve_cache_hit_still_attributes_click() {
        let mut cache = MockCacheService::new();
        cache
            .expect_get()
            .times(1)
            .returning(|_| Ok(Some("http://example.com/page".to_string())));
        cache.expect_set().times(0);

        let mut links = MockLinkRepository::new();
        links
            .expect_find_by_code()
            .times(1)
            .returning(|_| Ok(Some(create_test_link(3, "abc123", "http://example.com/page"))));

        let (service, mut rx) = service(links, MockClickRepository::new(), Arc::new(cache));

        let url = service.resolve_short_link("abc123", client()).await.unwrap();
        assert_eq!(url, "http://example.com/page");

        let event = rx.try_recv().unwrap();
        assert_eq!(event.link_id, Some(3));
        assert_eq!(event.ip_address, "203.0.113.9");
        assert_eq!(event.user_agent, "curl/8.0");
        assert_eq!(event.referer, "");
    }

    #[tokio::test]
    async fn test_resolve_cache_hit_with_failed_lookup_skips_attribution() {
        let mut cache = MockCacheService::new();
        cache
            .expect_get()
            .returning(|_| Ok(Some("http://example.com/page".to_string())));

        let mut links = MockLinkRepository::new();
        links
            .expect_find_by_code()
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let (service, mut rx) = service(links, MockClickRepository::new(), Arc::new(cache));

        let url = service.resolve_short_link("abc123", client()).await.unwrap();
        assert_eq!(url, "http://example.com/page");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_resolve_cache_miss_backfills() {
        let mut cache = MockCacheService::new();
        cache.expect_get().times(1).returning(|_| Ok(None));
        cache
            .expect_set()
            .withf(|code, url, _| code == "abc123" && url == "http://example.com/page")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut links = MockLinkRepository::new();
        links
            .expect_find_by_code()
            .times(1)
            .returning(|_| Ok(Some(create_test_link(3, "abc123", "http://example.com/page"))));

        let (service, mut rx) = service(links, MockClickRepository::new(), Arc::new(cache));

        let url = service.resolve_short_link("abc123", client()).await.unwrap();
        assert_eq!(url, "http://example.com/page");
        assert_eq!(rx.try_recv().unwrap().link_id, Some(3));
    }

    #[tokio::test]
    async fn test_resolve_not_found_records_nothing() {
        let mut links = MockLinkRepository::new();
        links.expect_find_by_code().times(1).returning(|_| Ok(None));

        let (service, mut rx) = service(
            links,
            MockClickRepository::new(),
            Arc::new(NullCache::new()),
        );

        let result = service.resolve_short_link("nope", client()).await;

        assert!(matches!(result.unwrap_err(), AppError::NotFound { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cache_write_failure_is_ignored() {
        let mut cache = MockCacheService::new();
        cache.expect_set().times(1).returning(|_, _, _| {
            Err(crate::infrastructure::cache::CacheError::OperationError(
                "down".to_string(),
            ))
        });

        let mut links = MockLinkRepository::new();
        links.expect_find_by_url().returning(|_| Ok(None));
        links.expect_code_exists().returning(|_| Ok(false));
        links
            .expect_create()
            .returning(|n| Ok(create_test_link(1, &n.short_code, &n.original_url)));

        let (service, _rx) = service(links, MockClickRepository::new(), Arc::new(cache));

        assert!(service.create_short_link("https://example.com", None).await.is_ok());
    }
}
