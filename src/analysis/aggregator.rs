//! Area aggregation and statistics.
//!
//! This module reduces individual fixture records into one status
//! record per named area and computes summary statistics over them.

use crate::models::{AreaStatus, FixtureRecord, LightingStatus, Position, StatusSummary};
use std::collections::BTreeMap;
use tracing::debug;

/// Running totals for one area while grouping.
#[derive(Debug, Default)]
struct AreaAccumulator {
    total: usize,
    working: usize,
    flickering: usize,
    located: usize,
    latitude_sum: f64,
    longitude_sum: f64,
}

impl AreaAccumulator {
    fn push(&mut self, record: &FixtureRecord) {
        self.total += 1;
        if record.is_working {
            self.working += 1;
        }
        if record.is_flickering {
            self.flickering += 1;
        }
        if let Some(position) = record.position() {
            self.located += 1;
            self.latitude_sum += position.latitude;
            self.longitude_sum += position.longitude;
        }
    }

    fn finish(self, area: String) -> AreaStatus {
        let lighting_ratio = lighting_ratio(self.working, self.total);

        let position = (self.located > 0).then(|| {
            Position::new(
                self.latitude_sum / self.located as f64,
                self.longitude_sum / self.located as f64,
            )
        });

        AreaStatus {
            area,
            total_count: self.total,
            working_count: self.working,
            flickering_count: self.flickering,
            lighting_ratio,
            status: LightingStatus::from_ratio(lighting_ratio),
            position,
        }
    }
}

/// Fraction of working fixtures; 0.0 for an empty group.
pub fn lighting_ratio(working: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    working as f64 / total as f64
}

/// Aggregate fixture records into one status record per area.
///
/// Areas are keyed by their literal name and returned sorted by it.
/// Records with an empty area name cannot be grouped and are skipped.
pub fn aggregate(records: &[FixtureRecord]) -> Vec<AreaStatus> {
    let mut grouped: BTreeMap<&str, AreaAccumulator> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in records {
        if record.area.is_empty() {
            skipped += 1;
            continue;
        }
        grouped.entry(record.area.as_str()).or_default().push(record);
    }

    if skipped > 0 {
        debug!("Skipped {} fixtures without an area", skipped);
    }

    let areas: Vec<AreaStatus> = grouped
        .into_iter()
        .map(|(area, acc)| acc.finish(area.to_string()))
        .collect();

    debug!(
        "Aggregated {} fixtures into {} areas",
        records.len() - skipped,
        areas.len()
    );

    areas
}

/// Compute area and fixture totals.
pub fn summarize(areas: &[AreaStatus]) -> StatusSummary {
    let mut summary = StatusSummary {
        areas: areas.len(),
        ..StatusSummary::default()
    };

    for area in areas {
        match area.status {
            LightingStatus::WellLit => summary.well_lit += 1,
            LightingStatus::PoorlyLit => summary.poorly_lit += 1,
        }
        if area.position.is_none() {
            summary.unlocated += 1;
        }
        summary.total_fixtures += area.total_count;
        summary.working_fixtures += area.working_count;
        summary.flickering_fixtures += area.flickering_count;
    }

    summary
}

/// Group areas by lighting status.
pub fn areas_by_status(areas: &[AreaStatus]) -> BTreeMap<String, Vec<&AreaStatus>> {
    let mut grouped: BTreeMap<String, Vec<&AreaStatus>> = BTreeMap::new();

    for area in areas {
        grouped.entry(area.status.to_string()).or_default().push(area);
    }

    grouped
}

/// Get the `n` areas with the lowest lighting ratio.
pub fn darkest_areas(areas: &[AreaStatus], n: usize) -> Vec<&AreaStatus> {
    let mut sorted: Vec<&AreaStatus> = areas.iter().collect();

    sorted.sort_by(|a, b| {
        a.lighting_ratio
            .partial_cmp(&b.lighting_ratio)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.area.cmp(&b.area))
    });
    sorted.truncate(n);

    sorted
}

/// Areas that have no representative position.
pub fn unlocated_areas(areas: &[AreaStatus]) -> Vec<&AreaStatus> {
    areas.iter().filter(|a| a.position.is_none()).collect()
}
