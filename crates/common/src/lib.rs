//! Shared utilities, configuration, and error handling for Crux
//!
//! This crate provides common functionality used across the Crux services:
//! - Configuration management following 12-factor principles
//! - Error types and their HTTP translation
//! - Request extractors

pub mod config;
pub mod error;
pub mod extractors;

pub use config::Config;
pub use error::Error;
pub use extractors::ValidatedJson;
