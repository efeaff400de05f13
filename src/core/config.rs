//! Configuration types and management for livemeasure-rs.
//!
//! Configuration is read from YAML. Every section has defaults, so an empty
//! file is a valid configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{LiveMeasureError, Result};
use crate::core::rating::{DebtRatingGrid, DEFAULT_DEBT_RATING_GRID};

/// Main configuration for the live measure engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveMeasureConfig {
    /// Rating computation settings
    #[serde(default)]
    pub rating: RatingConfig,

    /// Logging settings used by the binary
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LiveMeasureConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            LiveMeasureError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        serde_yaml::from_str(&content).map_err(Into::into)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            LiveMeasureError::io(
                format!("Failed to write config file: {}", path.display()),
                e,
            )
        })
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        self.rating.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Debt rating grid used when a project has no override.
    pub fn debt_rating_grid(&self) -> Result<DebtRatingGrid> {
        self.rating.grid()
    }
}

/// Rating configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingConfig {
    /// Upper density bounds of ratings A to D
    pub debt_rating_grid: Vec<f64>,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            debt_rating_grid: DEFAULT_DEBT_RATING_GRID.to_vec(),
        }
    }
}

impl RatingConfig {
    /// Validate rating configuration
    pub fn validate(&self) -> Result<()> {
        self.grid().map(|_| ())
    }

    fn grid(&self) -> Result<DebtRatingGrid> {
        let bounds: [f64; 4] = self.debt_rating_grid.as_slice().try_into().map_err(|_| {
            LiveMeasureError::config_field(
                format!(
                    "debt_rating_grid needs 4 bounds, got {}",
                    self.debt_rating_grid.len()
                ),
                "rating.debt_rating_grid",
            )
        })?;
        DebtRatingGrid::new(bounds).map_err(|e| {
            LiveMeasureError::config_field(e.to_string(), "rating.debt_rating_grid")
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level: trace, debug, info, warn or error
    pub level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Result<()> {
        match self.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(LiveMeasureError::config_field(
                format!("Unknown log level '{other}'"),
                "logging.level",
            )),
        }
    }
}
