//! Data Transfer Objects for API requests and responses.
//!
//! Responses are plain `Serialize` structs. Request bodies derive `Validate`
//! and query strings go through `serde_with` for lenient number parsing.

pub mod admin;
pub mod health;
pub mod links;
pub mod pagination;
pub mod qr;
pub mod shorten;
pub mod stats;
