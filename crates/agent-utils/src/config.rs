//! Configuration management utilities
//!
//! [`AppConfig`] is assembled in layers: defaults, an optional JSON file,
//! `AGENT_*` environment variables, then command-line flags applied by the
//! binary through the builder.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Model name passed to the model router
    pub model: String,
    /// Iteration budget of one agent run
    pub max_iterations: usize,
    /// Root directory scanned for skills
    pub skills_dir: PathBuf,
    /// Directory charts are written to
    pub output_dir: PathBuf,
    /// Route data-fetch tools through the skill tier first
    pub use_skills: bool,
    /// Market data cache lifetime in seconds
    pub cache_ttl_secs: u64,
    /// Outbound market data requests allowed per minute
    pub requests_per_minute: u32,
    /// Look-back window used by the `analyze` shortcut
    pub default_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_iterations: 5,
            skills_dir: PathBuf::from("skills"),
            output_dir: PathBuf::from("outputs"),
            use_skills: true,
            cache_ttl_secs: 300,
            requests_per_minute: 60,
            default_days: 60,
        }
    }
}

impl AppConfig {
    /// Create a new configuration builder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Load configuration from a JSON file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `AGENT_*` overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `AGENT_*` overrides using `lookup` as the environment
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("AGENT_MODEL") {
            self.model = model;
        }
        if let Some(raw) = lookup("AGENT_MAX_ITERATIONS") {
            self.max_iterations = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: "AGENT_MAX_ITERATIONS".to_string(),
                value: raw.clone(),
            })?;
        }
        if let Some(dir) = lookup("AGENT_SKILLS_DIR") {
            self.skills_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("AGENT_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("AGENT_USE_SKILLS") {
            self.use_skills = parse_flag(&raw).ok_or_else(|| ConfigError::InvalidEnv {
                key: "AGENT_USE_SKILLS".to_string(),
                value: raw.clone(),
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "max_iterations must be greater than 0".to_string(),
            ));
        }
        if self.requests_per_minute == 0 {
            return Err(ConfigError::Invalid(
                "requests_per_minute must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    base: Option<AppConfig>,
    model: Option<String>,
    max_iterations: Option<usize>,
    skills_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    use_skills: Option<bool>,
    cache_ttl_secs: Option<u64>,
    requests_per_minute: Option<u32>,
    default_days: Option<u32>,
}

impl AppConfigBuilder {
    /// Start from an already loaded configuration instead of the defaults
    pub fn base(mut self, config: AppConfig) -> Self {
        self.base = Some(config);
        self
    }

    /// Set the model name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the iteration budget
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    /// Set the skills root directory
    pub fn skills_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.skills_dir = Some(dir.into());
        self
    }

    /// Set the chart output directory
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Enable or disable the skill tier
    pub fn use_skills(mut self, enabled: bool) -> Self {
        self.use_skills = Some(enabled);
        self
    }

    /// Set the market data cache lifetime
    pub fn cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = Some(secs);
        self
    }

    /// Set the outbound request quota
    pub fn requests_per_minute(mut self, quota: u32) -> Self {
        self.requests_per_minute = Some(quota);
        self
    }

    /// Set the default look-back window
    pub fn default_days(mut self, days: u32) -> Self {
        self.default_days = Some(days);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig> {
        let base = self.base.unwrap_or_default();

        let config = AppConfig {
            model: self.model.unwrap_or(base.model),
            max_iterations: self.max_iterations.unwrap_or(base.max_iterations),
            skills_dir: self.skills_dir.unwrap_or(base.skills_dir),
            output_dir: self.output_dir.unwrap_or(base.output_dir),
            use_skills: self.use_skills.unwrap_or(base.use_skills),
            cache_ttl_secs: self.cache_ttl_secs.unwrap_or(base.cache_ttl_secs),
            requests_per_minute: self.requests_per_minute.unwrap_or(base.requests_per_minute),
            default_days: self.default_days.unwrap_or(base.default_days),
        };

        config.validate()?;
        Ok(config)
    }
}
