//! Per-client token-bucket admission control.
//!
//! Each [`RateLimiter`] owns one bucket per client key behind a single lock.
//! Buckets refill lazily when checked: `floor(elapsed / refill_period)` whole
//! tokens are added, capped at the burst capacity, and the refill timestamp
//! only moves when at least one token was added. A background sweep drops
//! buckets that have not refilled within the retention window.
//!
//! Limiters are process-local; several service instances do not share state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How long an idle bucket is kept before the sweep removes it.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// How often the background sweep runs.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Source of the current instant, swappable in tests.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// Wall-clock time via [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Refill period and burst capacity of a limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Time it takes to earn one token.
    pub refill_period: Duration,
    /// Maximum number of tokens a bucket holds.
    pub burst: u32,
}

impl RateLimitConfig {
    /// Creates a config. A zero period is raised to 1ms and a zero burst to 1.
    pub fn new(refill_period: Duration, burst: u32) -> Self {
        Self {
            refill_period: refill_period.max(Duration::from_millis(1)),
            burst: burst.max(1),
        }
    }

    /// General traffic: 100 requests per minute, bursts of 100.
    pub fn general() -> Self {
        Self::new(Duration::from_millis(600), 100)
    }

    /// Link creation: 10 per minute, bursts of 10.
    pub fn create() -> Self {
        Self::new(Duration::from_secs(6), 10)
    }

    /// QR payloads: 20 per minute, bursts of 20.
    pub fn qr() -> Self {
        Self::new(Duration::from_secs(3), 20)
    }

    /// Seconds a rejected client should wait: the refill period rounded up, at least 1.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.refill_period.as_secs_f64().ceil() as u64;
        secs.max(1)
    }
}

#[derive(Debug, Clone, Copy)]
struct ClientBucket {
    tokens: u32,
    last_refill: Instant,
}

/// Token-bucket limiter keyed by client (IP address string).
pub struct RateLimiter<C: Clock = SystemClock> {
    name: &'static str,
    config: RateLimitConfig,
    retention: Duration,
    clients: Mutex<HashMap<String, ClientBucket>>,
    clock: C,
}

impl RateLimiter<SystemClock> {
    /// Creates a limiter using wall-clock time and the default retention.
    pub fn new(name: &'static str, config: RateLimitConfig) -> Self {
        Self::with_clock(name, config, DEFAULT_RETENTION, SystemClock)
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Creates a limiter with an explicit retention window and clock.
    pub fn with_clock(
        name: &'static str,
        config: RateLimitConfig,
        retention: Duration,
        clock: C,
    ) -> Self {
        Self {
            name,
            config,
            retention,
            clients: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Admits or rejects one request from `client_key`.
    ///
    /// A new key starts with `burst - 1` tokens and is admitted. Never fails.
    pub fn allow(&self, client_key: &str) -> bool {
        let now = self.clock.now();
        let mut clients = self.clients.lock();

        let Some(bucket) = clients.get_mut(client_key) else {
            clients.insert(
                client_key.to_string(),
                ClientBucket {
                    tokens: self.config.burst - 1,
                    last_refill: now,
                },
            );
            return true;
        };

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        let earned = elapsed.as_nanos() / self.config.refill_period.as_nanos();

        if earned > 0 {
            let refilled = u128::from(bucket.tokens) + earned;
            bucket.tokens = refilled.min(u128::from(self.config.burst)) as u32;
            bucket.last_refill = now;
        }

        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Removes buckets whose last refill is older than the retention window.
    ///
    /// Returns the number of buckets removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut clients = self.clients.lock();
        let before = clients.len();

        clients.retain(|_, bucket| {
            now.saturating_duration_since(bucket.last_refill) <= self.retention
        });

        before - clients.len()
    }

    /// Number of tracked clients.
    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }

    /// Tokens currently held by `client_key`, without refilling.
    pub fn tokens(&self, client_key: &str) -> Option<u32> {
        self.clients.lock().get(client_key).map(|b| b.tokens)
    }

    /// Runs [`Self::sweep`] every `interval` until `shutdown` is cancelled.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let limiter = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = limiter.sweep();
                        if removed > 0 {
                            debug!(
                                limiter = limiter.name,
                                removed, "Swept idle rate-limit buckets"
                            );
                        }
                    }
                }
            }

            debug!(limiter = limiter.name, "Rate-limit sweeper stopped");
        })
    }
}

/// Protected endpoint classes, each with an independent limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimiterClass {
    General,
    Create,
    Qr,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Throttled { retry_after_secs: u64 },
}

/// The set of limiters guarding the service, one per [`LimiterClass`].
#[derive(Clone)]
pub struct RateLimiters {
    pub general: Arc<RateLimiter>,
    pub create: Arc<RateLimiter>,
    pub qr: Arc<RateLimiter>,
}

impl RateLimiters {
    /// Creates the limiters with their production parameters.
    pub fn new() -> Self {
        Self::with_configs(
            RateLimitConfig::general(),
            RateLimitConfig::create(),
            RateLimitConfig::qr(),
        )
    }

    pub fn with_configs(
        general: RateLimitConfig,
        create: RateLimitConfig,
        qr: RateLimitConfig,
    ) -> Self {
        Self {
            general: Arc::new(RateLimiter::new("general", general)),
            create: Arc::new(RateLimiter::new("create", create)),
            qr: Arc::new(RateLimiter::new("qr", qr)),
        }
    }

    pub fn get(&self, class: LimiterClass) -> &Arc<RateLimiter> {
        match class {
            LimiterClass::General => &self.general,
            LimiterClass::Create => &self.create,
            LimiterClass::Qr => &self.qr,
        }
    }

    /// Checks `client_key` against the limiter for `class`.
    pub fn check(&self, class: LimiterClass, client_key: &str) -> Admission {
        let limiter = self.get(class);

        if limiter.allow(client_key) {
            Admission::Admitted
        } else {
            metrics::counter!("rate_limit_throttled_total", "limiter" => limiter.name())
                .increment(1);
            Admission::Throttled {
                retry_after_secs: limiter.config().retry_after_secs(),
            }
        }
    }

    /// Starts one sweep task per limiter.
    pub fn spawn_sweepers(
        &self,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        [&self.general, &self.create, &self.qr]
            .into_iter()
            .map(|limiter| limiter.spawn_sweeper(interval, shutdown.clone()))
            .collect()
    }
}

impl Default for RateLimiters {
    fn default() -> Self {
        Self::new()
    }
}
