//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Streetlight Watch - find poorly-lit areas near you
///
/// Aggregates per-fixture streetlight records into well-lit and
/// poorly-lit areas, then warns when the nearest poorly-lit area is
/// within the alert threshold of your position.
///
/// Examples:
///   streetlight-watch --data Delhi_Streetlights.csv
///   streetlight-watch --data lights.csv --lat 28.6315 --lng 77.2167
///   streetlight-watch --data lights.csv --location-file location.json --format json
///   streetlight-watch --data lights.csv --threshold 500 --fail-on-warning
///   streetlight-watch --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Fixture data file (CSV export)
    ///
    /// Columns default to: Street Light Number, Area, Latitude, Longitude,
    /// Working, Flickering. Can also be set in .streetlight.toml.
    #[arg(short, long, value_name = "FILE", env = "STREETLIGHT_DATA")]
    pub data: Option<PathBuf>,

    /// Current latitude in degrees
    #[arg(long, value_name = "DEG", env = "STREETLIGHT_LAT", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Current longitude in degrees
    #[arg(long, value_name = "DEG", env = "STREETLIGHT_LNG", allow_negative_numbers = true)]
    pub lng: Option<f64>,

    /// Location message written by a device or browser bridge
    ///
    /// JSON such as {"lat": 28.6, "lng": 77.2, "show_map": true} or
    /// {"show_map": true, "error": "Location access denied"}.
    #[arg(long, value_name = "FILE")]
    pub location_file: Option<PathBuf>,

    /// Alert distance in meters
    ///
    /// Warn when the nearest poorly-lit area is closer than this. Default: 1000.
    #[arg(short, long, value_name = "METERS")]
    pub threshold: Option<f64>,

    /// Seconds to wait for a location before using the fallback position
    #[arg(long, value_name = "SECS")]
    pub location_timeout: Option<u64>,

    /// Output file path for the report
    ///
    /// Default: streetlight_report.md, or the value in .streetlight.toml.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .streetlight.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Exit with code 2 when a proximity warning is raised
    #[arg(long)]
    pub fail_on_warning: bool,

    /// Generate a default .streetlight.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => {
                if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
                    return Err(format!("Latitude must be between -90 and 90, got {}", lat));
                }
                if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
                    return Err(format!("Longitude must be between -180 and 180, got {}", lng));
                }
                if self.location_file.is_some() {
                    return Err("Use either --lat/--lng or --location-file, not both".to_string());
                }
            }
            (None, None) => {}
            _ => return Err("--lat and --lng must be given together".to_string()),
        }

        if let Some(threshold) = self.threshold {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err("Threshold must be a positive number of meters".to_string());
            }
        }

        if self.location_timeout == Some(0) {
            return Err("Location timeout must be at least 1 second".to_string());
        }

        if let Some(ref data) = self.data {
            if !data.is_file() {
                return Err(format!("Data file does not exist: {}", data.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            data: None,
            lat: None,
            lng: None,
            location_file: None,
            threshold: None,
            location_timeout: None,
            output: None,
            format: OutputFormat::Markdown,
            config: None,
            verbose: false,
            quiet: false,
            fail_on_warning: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_defaults_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_coordinates() {
        let mut args = make_args();
        args.lat = Some(28.6);
        assert!(args.validate().is_err());

        args.lng = Some(77.2);
        assert!(args.validate().is_ok());

        args.lat = Some(91.0);
        assert!(args.validate().is_err());

        args.lat = Some(-33.9);
        args.lng = Some(-181.0);
        assert!(args.validate().is_err());

        args.lng = Some(18.4);
        args.location_file = Some(PathBuf::from("location.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_threshold_and_timeout() {
        let mut args = make_args();
        args.threshold = Some(0.0);
        assert!(args.validate().is_err());

        args.threshold = Some(250.0);
        args.location_timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_data_file() {
        let mut args = make_args();
        args.data = Some(PathBuf::from("/definitely/not/here.csv"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "streetlight-watch",
            "--data",
            "lights.csv",
            "--lat",
            "-33.92",
            "--lng",
            "18.42",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.data, Some(PathBuf::from("lights.csv")));
        assert_eq!(args.lat, Some(-33.92));
        assert_eq!(args.format, OutputFormat::Json);
    }
}
