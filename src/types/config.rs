//! Configuration for flightcache.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{FlightError, FlightResult};

/// Main configuration for flightcache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Recency cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Call deduplication settings.
    #[serde(default)]
    pub dedup: DedupConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Recency cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries. Zero disables size-based eviction.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_capacity() -> usize {
    128
}

/// Defaults for the `dedup` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Number of concurrent callers sharing one key.
    #[serde(default = "default_callers")]
    pub callers: usize,

    /// Simulated latency of the deduplicated function (in milliseconds).
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            callers: default_callers(),
            delay_ms: default_delay_ms(),
        }
    }
}

fn default_callers() -> usize {
    50
}

fn default_delay_ms() -> u64 {
    100
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> FlightResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the binary cannot act on.
    pub fn validate(&self) -> FlightResult<()> {
        if !matches!(self.general.log_format.as_str(), "text" | "json") {
            return Err(FlightError::config(format!(
                "log_format deve ser \"text\" ou \"json\", recebido \"{}\"",
                self.general.log_format
            )));
        }
        if self.dedup.callers == 0 {
            return Err(FlightError::config("dedup.callers deve ser maior que zero"));
        }
        Ok(())
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> FlightResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            cache: CacheConfig::default(),
            dedup: DedupConfig::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
