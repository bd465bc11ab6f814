//! Shared utilities for the financial analysis agent
//!
//! Logging setup and the application configuration used by the binary and
//! the runtime.

pub mod config;
pub mod logging;

pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use logging::{init_tracing, init_tracing_json, preview};
