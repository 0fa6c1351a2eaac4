//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod admin;
pub mod health;
pub mod links;
pub mod qr;
pub mod redirect;
pub mod shorten;
pub mod stats;

pub use admin::{admin_activity_handler, admin_stats_handler};
pub use health::{health_detailed_handler, health_handler};
pub use links::list_links_handler;
pub use qr::qr_handler;
pub use redirect::redirect_handler;
pub use shorten::shorten_handler;
pub use stats::stats_handler;
