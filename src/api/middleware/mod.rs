//! HTTP middleware for request processing and protection.
//!
//! Provides client identification, rate limiting, and observability middleware.

pub mod client_ip;
pub mod rate_limit;
pub mod tracing;
