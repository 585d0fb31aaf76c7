//! Proximity alerts for poorly-lit areas.
//!
//! Finds the poorly-lit area nearest to a query point using geodesic
//! (WGS-84 ellipsoid) distance and decides whether to warn.

use crate::models::{AlertDecision, AreaStatus, NearestArea, Position, QueryPoint};
use geo::{Distance, Geodesic, Point};
use std::cmp::Ordering;
use thiserror::Error;
use tracing::debug;

/// Distance under which a poorly-lit area triggers a warning.
pub const DEFAULT_THRESHOLD_METERS: f64 = 1000.0;

/// Errors raised by proximity evaluation.
#[derive(Debug, Error, PartialEq)]
pub enum AlertError {
    /// The query point cannot be used for distance computation.
    #[error("Invalid query point ({latitude}, {longitude}): coordinates must be finite")]
    InvalidInput { latitude: f64, longitude: f64 },
}

/// Geodesic distance in meters between two positions.
pub fn geodesic_distance(from: Position, to: Position) -> f64 {
    // geo points are (x = longitude, y = latitude)
    let origin = Point::new(from.longitude, from.latitude);
    let destination = Point::new(to.longitude, to.latitude);
    Geodesic.distance(origin, destination)
}

fn validate_query(query: QueryPoint) -> Result<(), AlertError> {
    if query.latitude.is_finite() && query.longitude.is_finite() {
        Ok(())
    } else {
        Err(AlertError::InvalidInput {
            latitude: query.latitude,
            longitude: query.longitude,
        })
    }
}

/// Find the nearest poorly-lit area that has a known position.
///
/// Returns `Ok(None)` when no such area exists. Areas whose distance cannot
/// be computed are skipped. Exact distance ties resolve to the area whose
/// name sorts first.
pub fn nearest_poorly_lit(
    areas: &[AreaStatus],
    query: QueryPoint,
) -> Result<Option<NearestArea>, AlertError> {
    validate_query(query)?;

    let nearest = areas
        .iter()
        .filter(|a| a.is_poorly_lit())
        .filter_map(|a| {
            a.position.map(|position| NearestArea {
                area: a.area.clone(),
                distance_meters: geodesic_distance(query, position),
                position,
            })
        })
        .filter(|candidate| {
            let usable = candidate.distance_meters.is_finite();
            if !usable {
                debug!("Ignoring {}: distance is not finite", candidate.area);
            }
            usable
        })
        .min_by(|a, b| {
            a.distance_meters
                .partial_cmp(&b.distance_meters)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.area.cmp(&b.area))
        });

    Ok(nearest)
}

/// Decide whether the query point is close to a poorly-lit area.
///
/// Yields [`AlertDecision::Warning`] when the nearest located poorly-lit
/// area is strictly closer than `threshold_meters`, and
/// [`AlertDecision::Safe`] otherwise, including when there is no
/// candidate at all.
///
/// # Errors
///
/// Returns [`AlertError::InvalidInput`] if the query point is not finite.
pub fn evaluate(
    areas: &[AreaStatus],
    query: QueryPoint,
    threshold_meters: f64,
) -> Result<AlertDecision, AlertError> {
    let Some(nearest) = nearest_poorly_lit(areas, query)? else {
        debug!("No located poorly-lit areas; nothing to warn about");
        return Ok(AlertDecision::Safe);
    };

    debug!(
        "Nearest poorly-lit area: {} at {:.1}m (threshold {:.0}m)",
        nearest.area, nearest.distance_meters, threshold_meters
    );

    if nearest.distance_meters < threshold_meters {
        Ok(AlertDecision::Warning {
            distance_meters: nearest.distance_meters,
            area: nearest.area,
        })
    } else {
        Ok(AlertDecision::Safe)
    }
}
