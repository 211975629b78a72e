//! Dashboard configuration.
//!
//! Read from a TOML file whose path comes from `--config`, the
//! [`CONFIG_ENV_VAR`] environment variable, or [`DEFAULT_CONFIG_PATH`], in
//! that order. A missing file yields the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use arrest_tracker_analytics_models::ChartKind;
use arrest_tracker_dataset::DataConfig;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "ARREST_TRACKER_CONFIG";

/// Config file used when nothing else is given.
pub const DEFAULT_CONFIG_PATH: &str = "arrest_tracker.toml";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for [`AppConfig`].
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Dataset file locations.
    pub data: DataConfig,
    /// Update-cycle behavior.
    pub dashboard: DashboardSettings,
}

/// Tunables for the view controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Chart style for the crime-type view.
    pub crime_chart: ChartKind,
    /// Largest crime-type selection that restricts the crime chart to the
    /// selected types instead of showing the top N.
    pub restrict_selection_max: usize,
    /// Filter cache entry lifetime, in seconds. 0 disables the cache.
    pub cache_ttl_secs: u64,
    /// Maximum cached filter combinations.
    pub cache_capacity: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            crime_chart: ChartKind::Bar,
            restrict_selection_max: 3,
            cache_ttl_secs: 300,
            cache_capacity: 64,
        }
    }
}

impl DashboardSettings {
    /// Filter cache entry lifetime.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl AppConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the text is not a valid config.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(toml_str)?)
    }

    /// Loads the config at `path`, falling back to defaults if the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                log::info!("Loading config from {}", path.display());
                Self::from_toml_str(&contents)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Picks the config path: `explicit`, then [`CONFIG_ENV_VAR`], then
    /// [`DEFAULT_CONFIG_PATH`].
    #[must_use]
    pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }
}
