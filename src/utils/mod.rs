//! Utility functions for code generation, URL handling and request metadata.

pub mod base_url;
pub mod code_generator;
pub mod url_normalizer;
