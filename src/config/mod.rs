//! Configuration module for project-explore
//!
//! Tunables for paging, category lookups and the location search.
//! Configuration is read from the user's config directory when present;
//! every field falls back to its default.

use config::{Config, ConfigError, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const fn default_page_size() -> u32 {
    9
}

const fn default_category_page_size() -> u32 {
    100
}

const fn default_poll_interval_ms() -> u64 {
    100
}

const fn default_resolve_timeout_ms() -> u64 {
    10_000
}

const fn default_location_delay_ms() -> u64 {
    100
}

const fn default_exact_count() -> bool {
    true
}

/// Explore configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ExploreConfig {
    /// Projects per page; both halves of a city/state split use it
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Categories fetched per request during the bulk load
    #[serde(default = "default_category_page_size")]
    pub category_page_size: u32,

    /// How often a pending category lookup re-checks the cache
    #[serde(default = "default_poll_interval_ms")]
    pub category_poll_interval_ms: u64,

    /// Upper bound on a pending category lookup
    #[serde(default = "default_resolve_timeout_ms")]
    pub category_resolve_timeout_ms: u64,

    /// Location searches faster than this never show a loading state
    #[serde(default = "default_location_delay_ms")]
    pub location_loading_delay_ms: u64,

    /// Ask the listing endpoint for exact totals
    #[serde(default = "default_exact_count")]
    pub exact_count: bool,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            category_page_size: default_category_page_size(),
            category_poll_interval_ms: default_poll_interval_ms(),
            category_resolve_timeout_ms: default_resolve_timeout_ms(),
            location_loading_delay_ms: default_location_delay_ms(),
            exact_count: default_exact_count(),
        }
    }
}

impl ExploreConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("project-explore").join("config.toml"))
    }

    /// Load configuration from the default location, or defaults if absent
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the directory cannot be created, the configuration
    /// cannot be serialized to TOML, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Reject values the paginators cannot work with
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` if a page size is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Message("page_size must be at least 1".to_string()));
        }
        if self.category_page_size == 0 {
            return Err(ConfigError::Message("category_page_size must be at least 1".to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub const fn category_poll_interval(&self) -> Duration {
        Duration::from_millis(self.category_poll_interval_ms)
    }

    #[must_use]
    pub const fn category_resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.category_resolve_timeout_ms)
    }

    #[must_use]
    pub const fn location_loading_delay(&self) -> Duration {
        Duration::from_millis(self.location_loading_delay_ms)
    }
}
