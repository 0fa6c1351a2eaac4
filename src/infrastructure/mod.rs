//! Infrastructure layer for external integrations.
//!
//! Concrete stores behind the domain traits: the PostgreSQL repositories and
//! the resolution cache chosen at startup.
//!
//! # Modules
//!
//! - [`cache`] - `CacheService` with Redis and always-miss implementations
//! - [`persistence`] - PostgreSQL repository implementations

pub mod cache;
pub mod persistence;
