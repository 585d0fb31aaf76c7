//! Fixture data loading.
//!
//! Reads streetlight exports (CSV) and maps their raw columns into
//! [`FixtureRecord`]s. Rows that cannot be grouped are skipped and
//! reported back as data-quality warnings instead of failing the load.

use crate::config::{ColumnMapping, DataConfig};
use crate::models::{
    is_valid_latitude, is_valid_longitude, DataWarning, FixtureRecord, WarningKind,
};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while loading fixture data.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The data file could not be opened.
    #[error("Failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The data could not be parsed as CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is missing from the header row.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// The file has no header row.
    #[error("Data file contains no header row")]
    Empty,
}

/// Loader settings.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Source column names.
    pub columns: ColumnMapping,
    /// Field delimiter.
    pub delimiter: u8,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMapping::default(),
            delimiter: b',',
        }
    }
}

impl From<&DataConfig> for LoaderConfig {
    fn from(config: &DataConfig) -> Self {
        Self {
            columns: config.columns.clone(),
            delimiter: config.delimiter_byte().unwrap_or(b','),
        }
    }
}

/// Result of loading a data file.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    /// Fixtures that could be grouped by area.
    pub fixtures: Vec<FixtureRecord>,
    /// Rows that were skipped or degraded.
    pub warnings: Vec<DataWarning>,
}

impl LoadOutcome {
    /// Number of rows that were skipped entirely.
    pub fn skipped_rows(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| w.kind == WarningKind::MissingArea)
            .count()
    }
}

/// Column positions resolved from the header row.
struct ColumnIndex {
    id: Option<usize>,
    area: usize,
    latitude: Option<usize>,
    longitude: Option<usize>,
    working: usize,
    flickering: Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &[String], columns: &ColumnMapping) -> Result<Self, LoadError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| LoadError::MissingColumn(name.to_string()))
        };

        let index = Self {
            id: find(columns.id.as_str()),
            area: require(columns.area.as_str())?,
            latitude: find(columns.latitude.as_str()),
            longitude: find(columns.longitude.as_str()),
            working: require(columns.working.as_str())?,
            flickering: find(columns.flickering.as_str()),
        };

        if index.latitude.is_none() || index.longitude.is_none() {
            warn!("Coordinate columns not found; no area will have a position");
        }

        Ok(index)
    }
}

/// Loads fixture records from a CSV file.
pub struct FixtureLoader {
    path: PathBuf,
    config: LoaderConfig,
}

impl FixtureLoader {
    /// Create a new loader for the given file.
    pub fn new(path: PathBuf, config: LoaderConfig) -> Self {
        Self { path, config }
    }

    /// Path of the data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all fixtures from the file.
    pub fn load(&self) -> Result<LoadOutcome, LoadError> {
        info!("Loading fixtures from {}", self.path.display());

        let file = File::open(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;

        load_from_reader(file, &self.config)
    }
}

/// Load fixtures from any CSV reader.
pub fn load_from_reader<R: Read>(
    reader: R,
    config: &LoaderConfig,
) -> Result<LoadOutcome, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::Empty);
    }

    let index = ColumnIndex::resolve(&headers, &config.columns)?;
    let mut outcome = LoadOutcome::default();

    for (i, result) in reader.records().enumerate() {
        let row = i + 1;
        let record = result?;
        let field = |col: Option<usize>| {
            col.and_then(|c| record.get(c)).unwrap_or("").trim()
        };

        let area = field(Some(index.area));
        if area.is_empty() {
            outcome.warnings.push(DataWarning {
                row,
                kind: WarningKind::MissingArea,
            });
            continue;
        }

        let latitude = parse_coordinate(field(index.latitude)).filter(|v| is_valid_latitude(*v));
        let longitude =
            parse_coordinate(field(index.longitude)).filter(|v| is_valid_longitude(*v));

        if latitude.is_none() != longitude.is_none() {
            outcome.warnings.push(DataWarning {
                row,
                kind: WarningKind::IncompleteCoordinates,
            });
        }

        let id = match field(index.id) {
            "" => row.to_string(),
            id => id.to_string(),
        };

        outcome.fixtures.push(FixtureRecord {
            id,
            area: area.to_string(),
            latitude,
            longitude,
            is_working: parse_flag(field(Some(index.working))),
            is_flickering: parse_flag(field(index.flickering)),
        });
    }

    debug!(
        "Loaded {} fixtures with {} warnings",
        outcome.fixtures.len(),
        outcome.warnings.len()
    );

    Ok(outcome)
}

/// Parse a 0/1 style flag. Anything unrecognised counts as false.
pub fn parse_flag(value: &str) -> bool {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" => true,
        other => other.parse::<f64>().map(|n| n == 1.0).unwrap_or(false),
    }
}

/// Parse a coordinate. Blank, non-numeric and non-finite values are absent.
pub fn parse_coordinate(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
Street Light Number,Area,Latitude,Longitude,Working,Flickering
SL-001,Connaught Place,28.6315,77.2167,1,0
SL-002,Connaught Place,28.6320,77.2170,0,1
SL-003,Lajpat Nagar,,,0,0
SL-004,,28.5700,77.2400,1,0
SL-005,Lajpat Nagar,abc,77.2400,yes,
";

    fn load_sample() -> LoadOutcome {
        load_from_reader(SAMPLE.as_bytes(), &LoaderConfig::default()).unwrap()
    }

    #[test]
    fn test_load_maps_columns() {
        let outcome = load_sample();
        assert_eq!(outcome.fixtures.len(), 4);

        let first = &outcome.fixtures[0];
        assert_eq!(first.id, "SL-001");
        assert_eq!(first.area, "Connaught Place");
        assert_eq!(first.latitude, Some(28.6315));
        assert_eq!(first.longitude, Some(77.2167));
        assert!(first.is_working);
        assert!(!first.is_flickering);

        assert!(outcome.fixtures[1].is_flickering);
    }

    #[test]
    fn test_blank_coordinates_are_absent_not_zero() {
        let outcome = load_sample();
        let blank = &outcome.fixtures[2];
        assert_eq!(blank.latitude, None);
        assert_eq!(blank.longitude, None);
    }

    #[test]
    fn test_missing_area_is_skipped_with_warning() {
        let outcome = load_sample();
        assert!(outcome.fixtures.iter().all(|f| !f.area.is_empty()));
        assert_eq!(outcome.skipped_rows(), 1);
        assert!(outcome.warnings.iter().any(|w| w.row == 4));
    }

    #[test]
    fn test_non_numeric_coordinate_is_flagged() {
        let outcome = load_sample();
        let partial = &outcome.fixtures[3];
        assert_eq!(partial.latitude, None);
        assert_eq!(partial.longitude, Some(77.24));
        assert!(partial.is_working);
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.row == 5 && w.kind == WarningKind::IncompleteCoordinates));
    }

    #[test]
    fn test_out_of_range_coordinate_is_dropped() {
        let data = "\
Area,Latitude,Longitude,Working
Karol Bagh,200,77.19,0
Karol Bagh,28.65,286,0
Karol Bagh,28.65,77.19,1
";
        let outcome = load_from_reader(data.as_bytes(), &LoaderConfig::default()).unwrap();
        assert_eq!(outcome.fixtures.len(), 3);
        assert_eq!(outcome.fixtures[0].latitude, None);
        assert_eq!(outcome.fixtures[0].longitude, Some(77.19));
        assert_eq!(outcome.fixtures[1].longitude, None);
        assert_eq!(outcome.fixtures[2].latitude, Some(28.65));

        let flagged: Vec<usize> = outcome
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::IncompleteCoordinates)
            .map(|w| w.row)
            .collect();
        assert_eq!(flagged, vec![1, 2]);
    }

    #[test]
    fn test_missing_required_column() {
        let data = "Street Light Number,Area,Latitude,Longitude\nSL-1,A,28.6,77.2\n";
        let err = load_from_reader(data.as_bytes(), &LoaderConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "Working"));
    }

    #[test]
    fn test_missing_id_falls_back_to_row_number() {
        let data = "Area,Working\nA,1\nB,0\n";
        let outcome = load_from_reader(data.as_bytes(), &LoaderConfig::default()).unwrap();
        assert_eq!(outcome.fixtures[0].id, "1");
        assert_eq!(outcome.fixtures[1].id, "2");
        assert!(outcome.fixtures.iter().all(|f| f.latitude.is_none()));
    }

    #[test]
    fn test_custom_columns_and_delimiter() {
        let data = "zone;ok;lat;lon\nNorth;1;28.7;77.1\n";
        let config = LoaderConfig {
            columns: ColumnMapping {
                area: "zone".to_string(),
                working: "ok".to_string(),
                latitude: "lat".to_string(),
                longitude: "lon".to_string(),
                ..ColumnMapping::default()
            },
            delimiter: b';',
        };

        let outcome = load_from_reader(data.as_bytes(), &config).unwrap();
        assert_eq!(outcome.fixtures.len(), 1);
        assert_eq!(outcome.fixtures[0].area, "North");
        assert_eq!(outcome.fixtures[0].latitude, Some(28.7));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("1.0"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("2"));
        assert!(!parse_flag("broken"));
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate(" 28.61 "), Some(28.61));
        assert_eq!(parse_coordinate(""), None);
        assert_eq!(parse_coordinate("n/a"), None);
        assert_eq!(parse_coordinate("NaN"), None);
        assert_eq!(parse_coordinate("inf"), None);
    }

    #[test]
    fn test_loader_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lights.csv");
        std::fs::write(&path, SAMPLE).unwrap();

        let loader = FixtureLoader::new(path, LoaderConfig::default());
        let outcome = tokio_test::assert_ok!(loader.load());
        assert_eq!(outcome.fixtures.len(), 4);
    }

    #[test]
    fn test_loader_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let loader =
            FixtureLoader::new(temp_dir.path().join("nope.csv"), LoaderConfig::default());
        let err = tokio_test::assert_err!(loader.load());
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
