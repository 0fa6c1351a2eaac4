//! Caching layer for fast redirect lookups.
//!
//! Provides a [`CacheService`] trait with two variants, chosen once at startup:
//! - [`RedisCache`] - Active Redis-backed cache
//! - [`NullCache`] - Disabled cache, always misses

mod null_cache;
mod redis_cache;
mod service;

pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CacheService};

#[cfg(test)]
pub use service::MockCacheService;
