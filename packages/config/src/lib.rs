#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Configuration for the climate need tools.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. the defaults embedded from `default.toml`
//! 2. an optional TOML file (`--config` or `CLIMATE_NEED_CONFIG`)
//! 3. environment variables (`CLIMATE_NEED_DATA`, `CLIMATE_NEED_BOUNDARIES`,
//!    `CLIMATE_NEED_OUTPUT_DIR`, `BIND_ADDR`, `PORT`)
//!
//! A config file only needs the keys it changes.

use std::path::{Path, PathBuf};

use climate_need_county_models::{
    CoercionPolicy, InvalidWeightError, ResilienceFallback, ScoringOptions, Weights,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_TOML: &str = include_str!("../default.toml");

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "CLIMATE_NEED_CONFIG";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML was malformed or had the wrong shape.
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value was out of range.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// What was wrong.
        message: String,
    },
}

impl From<InvalidWeightError> for ConfigError {
    fn from(e: InvalidWeightError) -> Self {
        Self::Invalid {
            message: e.to_string(),
        }
    }
}

/// Input file locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Flat county CSV.
    pub records: PathBuf,
    /// County boundary `GeoJSON`.
    pub boundaries: PathBuf,
    /// Boundary property holding the county code.
    pub boundary_key: String,
}

/// Scoring defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Default political weight.
    pub political_weight: f64,
    /// Default resilience weight.
    pub resilience_weight: f64,
    /// Missing-value policy.
    pub coercion: CoercionPolicy,
    /// Behavior when the resilience normalization is undefined.
    pub resilience_fallback: ResilienceFallback,
}

/// Report output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory reports are written to and served from.
    pub output_dir: PathBuf,
    /// Rows in the ranked table.
    pub top_n: usize,
}

/// Dashboard server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    pub bind: String,
    /// Listen port.
    pub port: u16,
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeedConfig {
    /// Input files.
    pub data: DataConfig,
    /// Scoring defaults.
    pub scoring: ScoringConfig,
    /// Report output.
    pub report: ReportConfig,
    /// Dashboard server.
    pub server: ServerConfig,
}

impl NeedConfig {
    /// The embedded defaults.
    ///
    /// # Panics
    ///
    /// Panics if the embedded `default.toml` is malformed (this is a
    /// compile-time guarantee since the file is embedded).
    #[must_use]
    pub fn defaults() -> Self {
        toml::from_str(DEFAULT_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded default config: {e}"))
    }

    /// Loads the full configuration stack.
    ///
    /// `path` wins over `CLIMATE_NEED_CONFIG`; with neither, only the
    /// defaults and the environment apply.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or the
    /// resulting configuration is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let path = path.map(Path::to_path_buf).or(from_env);

        let mut config = match &path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                log::info!("Loading config from {}", path.display());
                Self::from_overlay(&text)?
            }
            None => Self::defaults(),
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses `text` on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if `text` is not valid TOML or sets a
    /// key to a value of the wrong type.
    pub fn from_overlay(text: &str) -> Result<Self, ConfigError> {
        let mut base: toml::Table = toml::from_str(DEFAULT_TOML)?;
        let overlay: toml::Table = toml::from_str(text)?;
        merge(&mut base, overlay);
        Ok(toml::Value::Table(base).try_into()?)
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `PORT` is not a port number.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(records) = lookup("CLIMATE_NEED_DATA") {
            self.data.records = PathBuf::from(records);
        }
        if let Some(boundaries) = lookup("CLIMATE_NEED_BOUNDARIES") {
            self.data.boundaries = PathBuf::from(boundaries);
        }
        if let Some(output_dir) = lookup("CLIMATE_NEED_OUTPUT_DIR") {
            self.report.output_dir = PathBuf::from(output_dir);
        }
        if let Some(bind) = lookup("BIND_ADDR") {
            self.server.bind = bind;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                message: format!("PORT must be a port number, got '{port}'"),
            })?;
        }
        Ok(())
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights()?;
        if self.report.top_n == 0 {
            return Err(ConfigError::Invalid {
                message: "report.top_n must be at least 1".to_string(),
            });
        }
        if self.data.boundary_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "data.boundary_key must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The default weights.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidWeightError`] if a configured weight is outside
    /// `[0, 1]`.
    pub fn weights(&self) -> Result<Weights, InvalidWeightError> {
        Weights::new(
            self.scoring.political_weight,
            self.scoring.resilience_weight,
        )
    }

    /// The scoring options.
    #[must_use]
    pub const fn scoring_options(&self) -> ScoringOptions {
        ScoringOptions {
            coercion: self.scoring.coercion,
            resilience_fallback: self.scoring.resilience_fallback,
        }
    }
}

/// Recursively overlays `overlay` onto `base`; tables merge, values replace.
fn merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
