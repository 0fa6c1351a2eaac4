//! Repository trait definitions for the domain layer.
//!
//! These traits are the persistent-store boundary. Implementations live in
//! `crate::infrastructure::persistence`; mocks are generated with `mockall`
//! for unit tests.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Short link storage and lookups
//! - [`ClickRepository`] - Click recording and aggregation

pub mod click_repository;
pub mod link_repository;

pub use click_repository::{ClickRepository, DailyClicks, LabelCount};
pub use link_repository::LinkRepository;

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
