//! Data models for streetlight status tracking.
//!
//! This module contains the core data structures used throughout
//! the application for representing fixtures, areas, query points,
//! and alert decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum fraction of working fixtures for an area to count as well-lit.
pub const WELL_LIT_RATIO: f64 = 0.4;

/// Lighting status of an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingStatus {
    /// At least 40% of the area's fixtures are working
    WellLit,
    /// Fewer than 40% of the area's fixtures are working
    PoorlyLit,
}

impl fmt::Display for LightingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightingStatus::WellLit => write!(f, "Well-lit"),
            LightingStatus::PoorlyLit => write!(f, "Poorly-lit"),
        }
    }
}

impl LightingStatus {
    /// Classify a lighting ratio. Ties at the threshold are well-lit.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= WELL_LIT_RATIO {
            LightingStatus::WellLit
        } else {
            LightingStatus::PoorlyLit
        }
    }

    /// Returns an emoji representation of the status.
    pub fn emoji(&self) -> &'static str {
        match self {
            LightingStatus::WellLit => "🟢",
            LightingStatus::PoorlyLit => "🔴",
        }
    }

    /// Marker colour used when plotting the area on a map.
    pub fn marker_color(&self) -> &'static str {
        match self {
            LightingStatus::WellLit => "green",
            LightingStatus::PoorlyLit => "red",
        }
    }
}

/// A single physical streetlight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureRecord {
    /// Identifier of the fixture in the source data.
    pub id: String,
    /// Name of the area the fixture belongs to.
    pub area: String,
    /// Latitude in degrees, if known.
    pub latitude: Option<f64>,
    /// Longitude in degrees, if known.
    pub longitude: Option<f64>,
    /// Whether the fixture is currently working.
    pub is_working: bool,
    /// Whether the fixture flickers. Informational only.
    pub is_flickering: bool,
}

impl FixtureRecord {
    /// Returns the fixture's coordinate when both components are present and on the globe.
    pub fn position(&self) -> Option<Position> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Position::new(lat, lng)).filter(Position::is_valid),
            _ => None,
        }
    }
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether the latitude lies in `-90..=90` and the longitude in `-180..=180`.
    pub fn is_valid(&self) -> bool {
        is_valid_latitude(self.latitude) && is_valid_longitude(self.longitude)
    }
}

pub fn is_valid_latitude(latitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude)
}

pub fn is_valid_longitude(longitude: f64) -> bool {
    (-180.0..=180.0).contains(&longitude)
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// The point against which proximity to poorly-lit areas is evaluated.
pub type QueryPoint = Position;

/// Aggregated lighting status of one named area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaStatus {
    /// Area name, unique within one aggregation run.
    pub area: String,
    /// Number of fixtures in the area (including ones without coordinates).
    pub total_count: usize,
    /// Number of working fixtures.
    pub working_count: usize,
    /// Number of flickering fixtures.
    pub flickering_count: usize,
    /// `working_count / total_count`, in `0.0..=1.0`.
    pub lighting_ratio: f64,
    /// Classification derived from `lighting_ratio`.
    pub status: LightingStatus,
    /// Mean position of the fixtures that have coordinates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl AreaStatus {
    /// Returns true if the area is classified as poorly-lit.
    pub fn is_poorly_lit(&self) -> bool {
        self.status == LightingStatus::PoorlyLit
    }

    /// Percentage of working fixtures, for display.
    pub fn working_percent(&self) -> f64 {
        self.lighting_ratio * 100.0
    }
}

/// Outcome of a proximity evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "alert", rename_all = "snake_case")]
pub enum AlertDecision {
    /// The nearest poorly-lit area is within the alert threshold.
    Warning { distance_meters: f64, area: String },
    /// No poorly-lit area with a known position is within the threshold.
    Safe,
}

impl AlertDecision {
    pub fn is_warning(&self) -> bool {
        matches!(self, AlertDecision::Warning { .. })
    }
}

impl fmt::Display for AlertDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertDecision::Warning {
                distance_meters,
                area,
            } => write!(
                f,
                "⚠️ Caution: {:.0}m from {} ({})",
                distance_meters,
                area,
                LightingStatus::PoorlyLit
            ),
            AlertDecision::Safe => write!(f, "✅ You're in a well-lit area!"),
        }
    }
}

/// The nearest poorly-lit area to a query point, regardless of threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestArea {
    pub area: String,
    pub distance_meters: f64,
    pub position: Position,
}

/// Area and fixture counts across a whole aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    /// Number of distinct areas.
    pub areas: usize,
    /// Number of well-lit areas.
    pub well_lit: usize,
    /// Number of poorly-lit areas.
    pub poorly_lit: usize,
    /// Number of areas without a representative position.
    pub unlocated: usize,
    /// Total fixtures across all areas.
    pub total_fixtures: usize,
    /// Working fixtures across all areas.
    pub working_fixtures: usize,
    /// Flickering fixtures across all areas.
    pub flickering_fixtures: usize,
}

/// Where the query point of an evaluation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOrigin {
    /// The user's reported position.
    Device,
    /// The configured fallback position.
    Fallback,
}

impl fmt::Display for QueryOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOrigin::Device => write!(f, "device location"),
            QueryOrigin::Fallback => write!(f, "fallback location"),
        }
    }
}

/// Kind of data-quality problem found in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// The row has no area and was not loaded.
    MissingArea,
    /// Only one of latitude/longitude is usable.
    IncompleteCoordinates,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::MissingArea => write!(f, "missing area; row skipped"),
            WarningKind::IncompleteCoordinates => {
                write!(f, "incomplete coordinates; excluded from area position")
            }
        }
    }
}

/// A row that was dropped or degraded while loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataWarning {
    /// 1-based data row number (the header is row 0).
    pub row: usize,
    pub kind: WarningKind,
}

/// The point an alert was evaluated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    pub point: QueryPoint,
    pub origin: QueryOrigin,
}

/// Metadata about a status report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the fixture data file.
    pub data_source: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of fixtures loaded.
    pub fixtures_loaded: usize,
    /// Number of rows that could not be loaded.
    pub rows_skipped: usize,
    /// Alert threshold in meters.
    pub threshold_meters: f64,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// The complete streetlight status report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub query: QueryContext,
    pub summary: StatusSummary,
    /// Per-area status, sorted by area name.
    pub areas: Vec<AreaStatus>,
    /// Nearest located poorly-lit area, whether or not it triggered a warning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest: Option<NearestArea>,
    pub alert: AlertDecision,
    /// Data-quality warnings from loading.
    pub warnings: Vec<DataWarning>,
}
