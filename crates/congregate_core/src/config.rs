//! Core configuration loaded from TOML.
//!
//! # Responsibility
//! - Hold the tunable caps and view settings used by scheduling logic.
//! - Parse and validate `congregate.toml` style files.
//!
//! # Invariants
//! - Every section is optional; missing keys fall back to built-in defaults.
//! - A loaded config has been validated.

use crate::calendar::layout::HourRange;
use crate::calendar::recurrence::ExpansionLimits;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Logging settings handed to `init_logging`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`; build-mode default when unset.
    pub level: Option<String>,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub expansion: ExpansionLimits,
    pub day_view: HourRange,
    pub week_starts_on: Weekday,
    pub logging: LoggingConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            expansion: ExpansionLimits::default(),
            day_view: HourRange::default(),
            week_starts_on: Weekday::Sun,
            logging: LoggingConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.expansion.max_occurrences < 2 {
            return Err(ConfigError::Invalid(format!(
                "expansion.max_occurrences must be at least 2, got {}",
                self.expansion.max_occurrences
            )));
        }
        if self.expansion.never_horizon_months == 0 {
            return Err(ConfigError::Invalid(
                "expansion.never_horizon_months must be positive".to_string(),
            ));
        }
        let HourRange {
            start_hour,
            end_hour,
        } = self.day_view;
        if end_hour > 24 || start_hour >= end_hour {
            return Err(ConfigError::Invalid(format!(
                "day_view hours must satisfy start < end <= 24, got {start_hour}..{end_hour}"
            )));
        }
        Ok(())
    }
}
