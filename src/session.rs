//! Session state and location requests.
//!
//! The analysis core is stateless. Whatever needs to survive between
//! interactions (whether the map has been requested, the last known
//! position) lives in a [`SessionState`] owned by the caller and updated
//! from the outcome of each location request.

use crate::models::{QueryOrigin, QueryPoint};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Location payload posted by a device or browser bridge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationMessage {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub show_map: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LocationMessage {
    /// Interpret the message as a terminal location outcome.
    pub fn into_outcome(self) -> LocationOutcome {
        if let Some(error) = self.error {
            return LocationOutcome::Denied(error);
        }

        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => {
                let point = QueryPoint::new(lat, lng);
                if point.is_valid() {
                    LocationOutcome::Located(point)
                } else {
                    warn!("Ignoring out-of-range location ({}, {})", lat, lng);
                    LocationOutcome::Unavailable
                }
            }
            _ => LocationOutcome::Unavailable,
        }
    }
}

/// Terminal result of a location request.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationOutcome {
    /// The device reported a position.
    Located(QueryPoint),
    /// The user or platform refused access.
    Denied(String),
    /// No answer arrived in time.
    TimedOut,
    /// No location capability is configured, or it returned nothing usable.
    Unavailable,
}

impl fmt::Display for LocationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationOutcome::Located(point) => write!(f, "located at {}", point),
            LocationOutcome::Denied(reason) => write!(f, "denied ({})", reason),
            LocationOutcome::TimedOut => write!(f, "timed out"),
            LocationOutcome::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Where a location comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationSource {
    /// A position supplied directly (e.g. on the command line).
    Fixed(QueryPoint),
    /// A JSON [`LocationMessage`] written by a bridge process.
    MessageFile(PathBuf),
    /// No location capability.
    Unavailable,
}

impl LocationSource {
    /// Request the current location, giving up after `timeout`.
    pub async fn request(&self, timeout: Duration) -> LocationOutcome {
        match self {
            LocationSource::Fixed(point) => LocationOutcome::Located(*point),
            LocationSource::Unavailable => LocationOutcome::Unavailable,
            LocationSource::MessageFile(path) => {
                debug!("Waiting up to {:?} for {}", timeout, path.display());
                match tokio::time::timeout(timeout, wait_for_message(path)).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!("No location message at {} after {:?}", path.display(), timeout);
                        LocationOutcome::TimedOut
                    }
                }
            }
        }
    }
}

/// Delay between checks for a bridge message that has not arrived yet.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Poll `path` until the bridge has written a message to it.
async fn wait_for_message(path: &Path) -> LocationOutcome {
    loop {
        match tokio::fs::read_to_string(path).await {
            Ok(content) if !content.trim().is_empty() => return parse_message(&content),
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!("Failed to read location file {}: {}", path.display(), e);
                return LocationOutcome::Unavailable;
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn parse_message(content: &str) -> LocationOutcome {
    match serde_json::from_str::<LocationMessage>(content) {
        Ok(message) => message.into_outcome(),
        Err(e) => LocationOutcome::Denied(format!("malformed location message: {}", e)),
    }
}

/// Caller-owned state for one user session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Whether the status map has been requested.
    pub show_map: bool,
    /// Last position reported for the user.
    pub user_location: Option<QueryPoint>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a location request.
    ///
    /// Every terminal outcome shows the map; only a successful one keeps a position.
    pub fn apply(&mut self, outcome: &LocationOutcome) {
        self.show_map = true;
        self.user_location = match outcome {
            LocationOutcome::Located(point) => Some(*point),
            other => {
                info!("Location {}; using fallback position", other);
                None
            }
        };
    }

    /// The point to evaluate against: the user's position, or `fallback`.
    pub fn query_point(&self, fallback: QueryPoint) -> (QueryPoint, QueryOrigin) {
        match self.user_location {
            Some(point) => (point, QueryOrigin::Device),
            None => (fallback, QueryOrigin::Fallback),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn delhi() -> QueryPoint {
        QueryPoint::new(28.6139, 77.2090)
    }

    #[test]
    fn test_message_with_coordinates() {
        let outcome = parse_message(r#"{"lat": 28.63, "lng": 77.21, "show_map": true}"#);
        assert_eq!(outcome, LocationOutcome::Located(QueryPoint::new(28.63, 77.21)));
    }

    #[test]
    fn test_message_with_error_is_denied() {
        let outcome = parse_message(r#"{"show_map": true, "error": "Location access denied"}"#);
        assert_eq!(
            outcome,
            LocationOutcome::Denied("Location access denied".to_string())
        );
    }

    #[test]
    fn test_message_without_coordinates_is_unavailable() {
        assert_eq!(
            parse_message(r#"{"show_map": true}"#),
            LocationOutcome::Unavailable
        );
        assert_eq!(
            parse_message(r#"{"lat": 28.6, "show_map": true}"#),
            LocationOutcome::Unavailable
        );
    }

    #[test]
    fn test_message_out_of_range_is_unavailable() {
        assert_eq!(
            parse_message(r#"{"lat": 95, "lng": 77.2, "show_map": true}"#),
            LocationOutcome::Unavailable
        );
        assert_eq!(
            parse_message(r#"{"lat": 28.6, "lng": -181.0}"#),
            LocationOutcome::Unavailable
        );
        assert_eq!(
            parse_message(r#"{"lat": -90, "lng": 180}"#),
            LocationOutcome::Located(QueryPoint::new(-90.0, 180.0))
        );
    }

    #[test]
    fn test_malformed_message_is_denied() {
        assert!(matches!(
            parse_message("not json"),
            LocationOutcome::Denied(_)
        ));
    }

    #[test]
    fn test_session_starts_empty() {
        let session = SessionState::new();
        assert!(!session.show_map);
        assert_eq!(session.query_point(delhi()), (delhi(), QueryOrigin::Fallback));
    }

    #[test]
    fn test_session_apply_located() {
        let mut session = SessionState::new();
        let here = QueryPoint::new(28.5, 77.1);
        session.apply(&LocationOutcome::Located(here));

        assert!(session.show_map);
        assert_eq!(session.query_point(delhi()), (here, QueryOrigin::Device));
    }

    #[test]
    fn test_session_failure_clears_previous_location() {
        let mut session = SessionState::new();
        session.apply(&LocationOutcome::Located(QueryPoint::new(28.5, 77.1)));
        session.apply(&LocationOutcome::TimedOut);

        assert!(session.show_map);
        assert_eq!(session.user_location, None);
        assert_eq!(session.query_point(delhi()).1, QueryOrigin::Fallback);
    }

    #[tokio::test]
    async fn test_fixed_source() {
        let here = QueryPoint::new(-33.92, 18.42);
        let outcome = LocationSource::Fixed(here).request(TIMEOUT).await;
        assert_eq!(outcome, LocationOutcome::Located(here));
    }

    #[tokio::test]
    async fn test_unavailable_source() {
        let outcome = LocationSource::Unavailable.request(TIMEOUT).await;
        assert_eq!(outcome, LocationOutcome::Unavailable);
    }

    #[tokio::test]
    async fn test_message_file_source() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("location.json");
        std::fs::write(&path, r#"{"lat": 28.61, "lng": 77.23, "show_map": true}"#).unwrap();

        let outcome = LocationSource::MessageFile(path).request(TIMEOUT).await;
        assert_eq!(outcome, LocationOutcome::Located(QueryPoint::new(28.61, 77.23)));
    }

    #[tokio::test]
    async fn test_missing_message_file_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");

        let outcome = LocationSource::MessageFile(path)
            .request(Duration::from_millis(300))
            .await;
        assert_eq!(outcome, LocationOutcome::TimedOut);
    }

    #[tokio::test]
    async fn test_message_file_written_later_is_picked_up() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("location.json");

        let staging = temp_dir.path().join("location.json.tmp");
        let target = path.clone();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            tokio::fs::write(&staging, r#"{"lat": 28.57, "lng": 77.24}"#)
                .await
                .unwrap();
            tokio::fs::rename(&staging, &target).await.unwrap();
        });

        let outcome = LocationSource::MessageFile(path).request(TIMEOUT).await;
        writer.await.unwrap();
        assert_eq!(outcome, LocationOutcome::Located(QueryPoint::new(28.57, 77.24)));
    }

    #[tokio::test]
    async fn test_message_file_that_is_a_directory_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();

        let outcome = LocationSource::MessageFile(temp_dir.path().to_path_buf())
            .request(TIMEOUT)
            .await;
        assert_eq!(outcome, LocationOutcome::Unavailable);
    }
}
