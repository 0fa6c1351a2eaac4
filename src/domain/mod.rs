//! Domain layer containing business entities and logic.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Persistent-store trait definitions
//! - [`click_event`] - Click tracking event model
//! - [`click_worker`] - Fire-and-forget click recording
//! - [`rate_limiter`] - Per-client token-bucket admission control
//!
//! # Click Processing Flow
//!
//! 1. The redirect path resolves a code via [`crate::application::services::LinkService`]
//! 2. A [`click_event::ClickEvent`] is handed to [`click_worker::ClickRecorder`] (non-blocking)
//! 3. [`click_worker::run_click_worker`] persists it via [`repositories::ClickRepository`]
//! 4. Failures are logged and dropped

pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod rate_limiter;
pub mod repositories;
