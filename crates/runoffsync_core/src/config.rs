//! Model configuration loading.
//!
//! # Responsibility
//! - Describe the initial state of a model: logging, meteo distribution
//!   modes, station lists and enabled output quantities.
//! - Load it from JSON and validate values that serde cannot check.
//!
//! # Invariants
//! - Every field has a default, so an empty JSON object is a valid config.

use crate::logging::{default_log_level, normalize_level};
use crate::model::meteo::DistributionMode;
use crate::output::settings::{AggregationOption, OutputSettings, BOUNDARY_DISCHARGE};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Result alias for config loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Config loading and validation failures.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    InvalidLogLevel(String),
    UnknownQuantity(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::UnknownQuantity(name) => write!(f, "unknown output quantity: {name}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidLogLevel(_) => None,
            Self::UnknownQuantity(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Log level and directory used by `init_logging`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute log directory; a temp-dir default is used when absent.
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

/// Initial distribution mode per meteo dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeteoConfig {
    pub precipitation: DistributionMode,
    pub evaporation: DistributionMode,
    pub temperature: DistributionMode,
}

/// Initially enabled output quantities and their aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Quantity names to enable; every other quantity is disabled.
    pub enabled: Vec<String>,
    pub aggregation: AggregationOption,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            enabled: vec![BOUNDARY_DISCHARGE.to_string()],
            aggregation: AggregationOption::Current,
        }
    }
}

/// Initial state of one model.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub logging: LoggingConfig,
    pub meteo: MeteoConfig,
    pub meteo_stations: Vec<String>,
    pub temperature_stations: Vec<String>,
    pub output: OutputConfig,
}

impl SyncConfig {
    /// Parses and validates a JSON config.
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Checks the log level and every enabled quantity name.
    pub fn validate(&self) -> ConfigResult<()> {
        normalize_level(&self.logging.level).map_err(ConfigError::InvalidLogLevel)?;

        let catalog = OutputSettings::new();
        if let Some(name) = self
            .output
            .enabled
            .iter()
            .find(|name| !catalog.is_known_quantity(name))
        {
            return Err(ConfigError::UnknownQuantity(name.clone()));
        }
        Ok(())
    }

    /// Output settings with exactly the configured quantities enabled.
    pub fn output_settings(&self) -> OutputSettings {
        let mut settings = OutputSettings::new();
        settings.aggregation = self.output.aggregation;
        let names: Vec<String> = settings
            .engine_parameters()
            .iter()
            .map(|p| p.name.clone())
            .collect();
        for name in names {
            let enabled = self.output.enabled.contains(&name);
            settings.set_enabled(&name, enabled);
        }
        settings
    }
}
