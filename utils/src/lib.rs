//! Shared utilities: tracing initialization and deployment configuration.

pub mod config;
pub mod logging;

pub use config::{ConfigError, RngConfig};
pub use logging::init_tracing;
