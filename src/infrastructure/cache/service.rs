//! Cache service trait and error types.

use async_trait::async_trait;
use std::time::Duration;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Key/value cache for short code → original URL mappings.
///
/// Every operation is best-effort. Implementations log their own failures and
/// report them as a miss (`get`) or a successful no-op (`set`, `delete`), so an
/// unavailable cache behaves exactly like an always-empty one.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - Disabled cache, always misses
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Looks up a cached value. `Ok(None)` on miss or backend failure.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores a value. `ttl = None` uses the implementation default.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()>;

    /// Removes a value if present.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Whether the backend currently answers.
    async fn health_check(&self) -> bool;

    /// `false` for the disabled variant.
    fn is_enabled(&self) -> bool;
}
