#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use shorter::domain::click_worker::{ClickRecorder, run_click_worker};
use shorter::domain::entities::{Click, NewClick, NewLink, ShortLink};
use shorter::domain::rate_limiter::RateLimiters;
use shorter::domain::repositories::{ClickRepository, DailyClicks, LabelCount, LinkRepository};
use shorter::error::AppError;
use shorter::infrastructure::cache::{CacheResult, CacheService, NullCache};
use shorter::routes::router;
use shorter::state::{AppState, StateSettings};
use shorter::utils::url_normalizer::destination_host;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tower::Layer;

pub const BASE_URL: &str = "https://sho.rt";

// ── In-memory store ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryLinkRepository {
    links: Mutex<Vec<ShortLink>>,
    pub offline: AtomicBool,
}

impl InMemoryLinkRepository {
    pub fn all(&self) -> Vec<ShortLink> {
        self.links.lock().clone()
    }

    pub fn insert(&self, code: &str, url: &str) -> ShortLink {
        let mut links = self.links.lock();
        let link = ShortLink::new(
            links.len() as i64 + 1,
            url.to_string(),
            code.to_string(),
            None,
            Utc::now(),
        );
        links.push(link.clone());
        link
    }

    fn check_online(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::internal("Database error", serde_json::json!({})));
        }
        Ok(())
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<ShortLink, AppError> {
        self.check_online()?;
        let mut links = self.links.lock();
        if links.iter().any(|l| l.short_code == new_link.short_code) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                serde_json::json!({}),
            ));
        }
        let link = ShortLink::new(
            links.len() as i64 + 1,
            new_link.original_url,
            new_link.short_code,
            new_link.title,
            Utc::now(),
        );
        links.push(link.clone());
        Ok(link)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError> {
        self.check_online()?;
        Ok(self
            .links
            .lock()
            .iter()
            .find(|l| l.short_code == code)
            .cloned())
    }

    async fn find_by_url(&self, original_url: &str) -> Result<Option<ShortLink>, AppError> {
        self.check_online()?;
        Ok(self
            .links
            .lock()
            .iter()
            .find(|l| l.original_url == original_url)
            .cloned())
    }

    async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        self.check_online()?;
        Ok(self.links.lock().iter().any(|l| l.short_code == code))
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<ShortLink>, AppError> {
        self.check_online()?;
        Ok(self
            .links
            .lock()
            .iter()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        self.check_online()?;
        Ok(self.links.lock().len() as i64)
    }

    async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64, AppError> {
        self.check_online()?;
        Ok(self
            .links
            .lock()
            .iter()
            .filter(|l| l.created_at >= since)
            .count() as i64)
    }

    async fn top_destination_hosts(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<LabelCount>, AppError> {
        self.check_online()?;
        let labels = self
            .links
            .lock()
            .iter()
            .filter(|l| l.created_at >= since)
            .filter_map(|l| destination_host(&l.original_url))
            .collect::<Vec<_>>();
        Ok(top(labels, limit))
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.check_online()
    }
}

#[derive(Default)]
pub struct InMemoryClickRepository {
    clicks: Mutex<Vec<Click>>,
}

impl InMemoryClickRepository {
    pub fn all(&self) -> Vec<Click> {
        self.clicks.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.clicks.lock().len()
    }

    pub fn for_link(&self, link_id: i64) -> Vec<Click> {
        self.clicks
            .lock()
            .iter()
            .filter(|c| c.link_id == link_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ClickRepository for InMemoryClickRepository {
    async fn record_click(&self, new_click: NewClick) -> Result<Click, AppError> {
        let mut clicks = self.clicks.lock();
        let click = Click {
            id: clicks.len() as i64 + 1,
            link_id: new_click.link_id,
            ip_address: new_click.ip_address,
            user_agent: new_click.user_agent,
            referer: new_click.referer,
            country: new_click.country,
            city: new_click.city,
            created_at: Utc::now(),
        };
        clicks.push(click.clone());
        Ok(click)
    }

    async fn count_for_link(&self, link_id: i64) -> Result<i64, AppError> {
        Ok(self.for_link(link_id).len() as i64)
    }

    async fn count_for_links(&self, link_ids: &[i64]) -> Result<HashMap<i64, i64>, AppError> {
        let mut counts = HashMap::new();
        for click in self.clicks.lock().iter() {
            if link_ids.contains(&click.link_id) {
                *counts.entry(click.link_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn daily_clicks(
        &self,
        link_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyClicks>, AppError> {
        let mut per_day: HashMap<chrono::NaiveDate, i64> = HashMap::new();
        for click in self.for_link(link_id) {
            if click.created_at >= since {
                *per_day.entry(click.created_at.date_naive()).or_insert(0) += 1;
            }
        }
        let mut days: Vec<DailyClicks> = per_day
            .into_iter()
            .map(|(date, count)| DailyClicks { date, count })
            .collect();
        days.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(days)
    }

    async fn top_countries(&self, link_id: i64, limit: i64) -> Result<Vec<LabelCount>, AppError> {
        let labels = self
            .for_link(link_id)
            .into_iter()
            .filter_map(|c| c.country)
            .filter(|c| !c.is_empty())
            .collect();
        Ok(top(labels, limit))
    }

    async fn top_referers(&self, link_id: i64, limit: i64) -> Result<Vec<LabelCount>, AppError> {
        let labels = self
            .for_link(link_id)
            .into_iter()
            .map(|c| c.referer)
            .filter(|r| !r.is_empty())
            .collect();
        Ok(top(labels, limit))
    }

    async fn count_all(&self) -> Result<i64, AppError> {
        Ok(self.len() as i64)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<i64, AppError> {
        Ok(self
            .clicks
            .lock()
            .iter()
            .filter(|c| c.created_at >= since)
            .count() as i64)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Click>, AppError> {
        Ok(self
            .clicks
            .lock()
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

fn top(labels: Vec<String>, limit: i64) -> Vec<LabelCount> {
    let mut counts: HashMap<String, i64> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    let mut ranked: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    ranked.truncate(limit as usize);
    ranked
}

// ── In-memory cache ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
    pub gets: AtomicUsize,
    pub hits: AtomicUsize,
}

impl MemoryCache {
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let value = self.entries.lock().get(key).cloned();
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, _ttl: Option<Duration>) -> CacheResult<()> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

// ── Connect info ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockConnectInfoLayer(pub SocketAddr);

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService {
            inner,
            addr: self.0,
        }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
    addr: SocketAddr,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(ConnectInfo(self.addr));
        self.inner.call(req)
    }
}

// ── Test application ────────────────────────────────────────────────────────

pub struct TestApp {
    pub server: TestServer,
    pub links: Arc<InMemoryLinkRepository>,
    pub clicks: Arc<InMemoryClickRepository>,
}

impl TestApp {
    /// Waits until the click worker has stored `expected` clicks.
    pub async fn wait_for_clicks(&self, expected: usize) {
        for _ in 0..100 {
            if self.clicks.len() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {} clicks, found {}",
            expected,
            self.clicks.len()
        );
    }

    /// Gives the click worker time to process anything queued.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

pub struct TestAppBuilder {
    cache: Arc<dyn CacheService>,
    rate_limiters: RateLimiters,
    settings: StateSettings,
    peer: SocketAddr,
    links: Arc<InMemoryLinkRepository>,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            cache: Arc::new(NullCache::new()),
            rate_limiters: RateLimiters::new(),
            settings: StateSettings {
                base_url: Some(BASE_URL.to_string()),
                ..StateSettings::default()
            },
            peer: "127.0.0.1:12345".parse().unwrap(),
            links: Arc::new(InMemoryLinkRepository::default()),
        }
    }
}

impl TestAppBuilder {
    pub fn cache(mut self, cache: Arc<dyn CacheService>) -> Self {
        self.cache = cache;
        self
    }

    pub fn rate_limiters(mut self, rate_limiters: RateLimiters) -> Self {
        self.rate_limiters = rate_limiters;
        self
    }

    pub fn base_url(mut self, base_url: Option<&str>) -> Self {
        self.settings.base_url = base_url.map(str::to_string);
        self
    }

    pub fn behind_proxy(mut self) -> Self {
        self.settings.behind_proxy = true;
        self
    }

    pub fn links(mut self, links: Arc<InMemoryLinkRepository>) -> Self {
        self.links = links;
        self
    }

    pub fn build(self) -> TestApp {
        let clicks = Arc::new(InMemoryClickRepository::default());

        let (recorder, rx) = ClickRecorder::channel(1_000);
        tokio::spawn(run_click_worker(rx, clicks.clone(), 4));

        let state = AppState::new(
            self.links.clone(),
            clicks.clone(),
            self.cache,
            recorder,
            self.rate_limiters,
            self.settings,
        );

        let app = router(state).layer(MockConnectInfoLayer(self.peer));

        TestApp {
            server: TestServer::new(app).unwrap(),
            links: self.links,
            clicks,
        }
    }
}

pub fn test_app() -> TestApp {
    TestAppBuilder::default().build()
}

/// Connection-level helpers for the Postgres repository tests.
pub mod pg {
    use sqlx::PgPool;

    pub async fn insert_link(pool: &PgPool, code: &str, url: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO links (original_url, short_code) VALUES ($1, $2) RETURNING id",
        )
        .bind(url)
        .bind(code)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    pub async fn insert_deleted_link(pool: &PgPool, code: &str, url: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO links (original_url, short_code, deleted_at) VALUES ($1, $2, NOW()) RETURNING id",
        )
        .bind(url)
        .bind(code)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    pub async fn insert_click(pool: &PgPool, link_id: i64, referer: &str, country: Option<&str>) {
        sqlx::query(
            "INSERT INTO clicks (link_id, ip_address, user_agent, referer, country) VALUES ($1, '127.0.0.1', 'test', $2, $3)",
        )
        .bind(link_id)
        .bind(referer)
        .bind(country)
        .execute(pool)
        .await
        .unwrap();
    }
}
