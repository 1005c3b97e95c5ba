//! Configuration system
//!
//! Centralized configuration with:
//! - TOML config file loading (optional)
//! - Environment variable overrides
//! - Runtime defaults matching the historical aggregator behavior
//! - Validation before first use
//!
//! CLI flags take precedence over everything here; the config supplies the
//! defaults the CLI falls back to.

use crate::models::AggregationPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Default aggregation policy (overridable per-run from the CLI)
    pub aggregation: AggregationPolicy,

    /// Paths configuration
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub log_directory: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "ERROR".to_string(),
                format: "pretty".to_string(),
                output: "console".to_string(),
            },
            aggregation: AggregationPolicy::default(),
            paths: PathsConfig {
                log_directory: PathBuf::from("logs"),
            },
        }
    }
}

impl Config {
    /// Load configuration from file, environment, and defaults.
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        let config_paths = [
            PathBuf::from("lcr-rates.toml"),
            PathBuf::from(".lcr-rates.toml"),
            dirs::config_dir()
                .map(|d| d.join("lcr-rates").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                info!(config_file = %path.display(), "loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        if let Ok(val) = env::var("LCR_RATES_LCR_N") {
            self.aggregation.lcr_n = val.parse().context("invalid LCR_RATES_LCR_N")?;
        }
        if let Ok(val) = env::var("LCR_RATES_CHEAPEST_N") {
            self.aggregation.cheapest_n = val.parse().context("invalid LCR_RATES_CHEAPEST_N")?;
        }
        if let Ok(val) = env::var("LCR_RATES_DECIMAL_PLACES") {
            self.aggregation.decimal_places =
                val.parse().context("invalid LCR_RATES_DECIMAL_PLACES")?;
        }
        if let Ok(val) = env::var("LCR_RATES_FINAL_DECIMAL_PLACES") {
            self.aggregation.final_decimal_places = val
                .parse()
                .context("invalid LCR_RATES_FINAL_DECIMAL_PLACES")?;
        }
        if let Ok(val) = env::var("LCR_RATES_RATE_THRESHOLD") {
            self.aggregation.rate_threshold =
                val.parse().context("invalid LCR_RATES_RATE_THRESHOLD")?;
        }

        if let Ok(val) = env::var("LCR_RATES_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.aggregation.lcr_n == 0 {
            return Err(anyhow::anyhow!("LCR tier must be at least 1"));
        }
        if self.aggregation.cheapest_n == 0 {
            return Err(anyhow::anyhow!("cheapest window size must be at least 1"));
        }
        if self.aggregation.decimal_places > 12 || self.aggregation.final_decimal_places > 12 {
            return Err(anyhow::anyhow!(
                "decimal places out of range (0-12), got {} / {}",
                self.aggregation.decimal_places,
                self.aggregation.final_decimal_places
            ));
        }
        if !self.aggregation.rate_threshold.is_finite() || self.aggregation.rate_threshold <= 0.0 {
            return Err(anyhow::anyhow!(
                "rate threshold must be a positive number, got {}",
                self.aggregation.rate_threshold
            ));
        }

        // The log directory is only needed when file output is requested.
        if matches!(self.logging.output.as_str(), "file" | "both")
            && !self.paths.log_directory.exists()
        {
            fs::create_dir_all(&self.paths.log_directory)
                .context("failed to create log directory")?;
        }

        Ok(())
    }
}

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration instance
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(|| Config::load().unwrap_or_default())
}
