//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`ShortLink`] - A short code mapped to an original URL
//! - [`Click`] - A recorded redirect of a short link
//!
//! Creation inputs live in separate structs (`NewLink`, `NewClick`) since ids
//! and timestamps are assigned by the store.

pub mod click;
pub mod link;

pub use click::{Click, NewClick};
pub use link::{LinkWithClicks, NewLink, ShortLink};
