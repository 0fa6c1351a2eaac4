//! Business logic services for the application layer.

pub mod link_service;
pub mod stats_service;

pub use link_service::{ClientInfo, LinkService, ShortenOutcome};
pub use stats_service::{LinkStats, RecentActivity, StatsService, SystemStats};
