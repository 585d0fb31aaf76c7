//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.streetlight.toml` files.

use crate::analysis::DEFAULT_THRESHOLD_METERS;
use crate::models::QueryPoint;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".streetlight.toml";

/// Fallback query point used when no device location is available (central New Delhi).
pub const DEFAULT_FALLBACK_LOCATION: (f64, f64) = (28.6139, 77.2090);

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Fixture data settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Proximity alert settings.
    #[serde(default)]
    pub alert: AlertConfig,

    /// Location request settings.
    #[serde(default)]
    pub location: LocationConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "streetlight_report.md".to_string()
}

/// Fixture data source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the fixture CSV export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Field delimiter (a single character).
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Source column names.
    #[serde(default)]
    pub columns: ColumnMapping,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: None,
            delimiter: default_delimiter(),
            columns: ColumnMapping::default(),
        }
    }
}

impl DataConfig {
    /// The delimiter as a byte, if it is exactly one ASCII character.
    pub fn delimiter_byte(&self) -> Option<u8> {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => Some(*b),
            _ => None,
        }
    }
}

fn default_delimiter() -> String {
    ",".to_string()
}

/// Names of the columns in the fixture export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(default = "default_id_column")]
    pub id: String,
    #[serde(default = "default_area_column")]
    pub area: String,
    #[serde(default = "default_latitude_column")]
    pub latitude: String,
    #[serde(default = "default_longitude_column")]
    pub longitude: String,
    #[serde(default = "default_working_column")]
    pub working: String,
    #[serde(default = "default_flickering_column")]
    pub flickering: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            id: default_id_column(),
            area: default_area_column(),
            latitude: default_latitude_column(),
            longitude: default_longitude_column(),
            working: default_working_column(),
            flickering: default_flickering_column(),
        }
    }
}

impl ColumnMapping {
    fn names(&self) -> [(&'static str, &str); 6] {
        [
            ("id", self.id.as_str()),
            ("area", self.area.as_str()),
            ("latitude", self.latitude.as_str()),
            ("longitude", self.longitude.as_str()),
            ("working", self.working.as_str()),
            ("flickering", self.flickering.as_str()),
        ]
    }
}

fn default_id_column() -> String {
    "Street Light Number".to_string()
}

fn default_area_column() -> String {
    "Area".to_string()
}

fn default_latitude_column() -> String {
    "Latitude".to_string()
}

fn default_longitude_column() -> String {
    "Longitude".to_string()
}

fn default_working_column() -> String {
    "Working".to_string()
}

fn default_flickering_column() -> String {
    "Flickering".to_string()
}

/// Proximity alert settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Warn when the nearest poorly-lit area is closer than this many meters.
    #[serde(default = "default_threshold")]
    pub threshold_meters: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            threshold_meters: default_threshold(),
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD_METERS
}

/// Location request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Latitude used when the device location is unavailable.
    #[serde(default = "default_fallback_latitude")]
    pub fallback_latitude: f64,

    /// Longitude used when the device location is unavailable.
    #[serde(default = "default_fallback_longitude")]
    pub fallback_longitude: f64,

    /// How long to wait for a location before falling back.
    #[serde(default = "default_location_timeout")]
    pub timeout_seconds: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            fallback_latitude: default_fallback_latitude(),
            fallback_longitude: default_fallback_longitude(),
            timeout_seconds: default_location_timeout(),
        }
    }
}

fn default_fallback_latitude() -> f64 {
    DEFAULT_FALLBACK_LOCATION.0
}

fn default_fallback_longitude() -> f64 {
    DEFAULT_FALLBACK_LOCATION.1
}

fn default_location_timeout() -> u64 {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// where they were explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.data.path = Some(data.clone());
        }

        if let Some(threshold) = args.threshold {
            self.alert.threshold_meters = threshold;
        }

        if let Some(timeout) = args.location_timeout {
            self.location.timeout_seconds = timeout;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
    }

    /// Check that the merged configuration is usable.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.alert.threshold_meters;
        if !threshold.is_finite() || threshold <= 0.0 {
            bail!("Alert threshold must be a positive number of meters, got {}", threshold);
        }

        let lat = self.location.fallback_latitude;
        let lng = self.location.fallback_longitude;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            bail!("Fallback location ({}, {}) is out of range", lat, lng);
        }

        if self.location.timeout_seconds == 0 {
            bail!("Location timeout must be at least 1 second");
        }

        if self.data.delimiter_byte().is_none() {
            bail!(
                "Delimiter must be a single ASCII character, got {:?}",
                self.data.delimiter
            );
        }

        for (key, name) in self.data.columns.names() {
            if name.trim().is_empty() {
                bail!("Column name for '{}' must not be empty", key);
            }
        }

        Ok(())
    }

    /// The query point used when the device location is unavailable.
    pub fn fallback_point(&self) -> QueryPoint {
        QueryPoint::new(
            self.location.fallback_latitude,
            self.location.fallback_longitude,
        )
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
