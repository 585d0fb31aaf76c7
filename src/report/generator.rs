//! Markdown and JSON report generation.
//!
//! This module renders the area status table and proximity alert of a
//! run as a Markdown document or as JSON.

use crate::analysis::{areas_by_status, darkest_areas, unlocated_areas};
use crate::models::{
    AlertDecision, AreaStatus, DataWarning, NearestArea, QueryContext, Report, ReportMetadata,
    StatusSummary,
};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Streetlight Status Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_alert_section(
        &report.alert,
        &report.query,
        report.nearest.as_ref(),
    ));
    output.push_str(&generate_summary_section(&report.summary, &report.areas));
    output.push_str(&generate_area_table(&report.areas));
    output.push_str(&generate_data_quality_section(&report.warnings, &report.areas));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Data Source:** `{}`\n", metadata.data_source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Fixtures Loaded:** {}\n",
        metadata.fixtures_loaded
    ));
    if metadata.rows_skipped > 0 {
        section.push_str(&format!("- **Rows Skipped:** {}\n", metadata.rows_skipped));
    }
    section.push_str(&format!(
        "- **Alert Threshold:** {:.0} m\n",
        metadata.threshold_meters
    ));
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the proximity alert section.
fn generate_alert_section(
    alert: &AlertDecision,
    query: &QueryContext,
    nearest: Option<&NearestArea>,
) -> String {
    let mut section = String::new();

    section.push_str("## Proximity Alert\n\n");
    match alert {
        AlertDecision::Warning { .. } => section.push_str(&format!("> **{}**\n\n", alert)),
        AlertDecision::Safe => section.push_str(&format!("> {}\n\n", alert)),
    }

    section.push_str(&format!(
        "- **Evaluated At:** {} ({})\n",
        query.point, query.origin
    ));
    match nearest {
        Some(n) => section.push_str(&format!(
            "- **Nearest Poorly-lit Area:** {} ({:.0} m away)\n",
            n.area, n.distance_meters
        )),
        None => section.push_str("- **Nearest Poorly-lit Area:** none with a known position\n"),
    }
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(summary: &StatusSummary, areas: &[AreaStatus]) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| 🟢 Well-lit | 🔴 Poorly-lit | **Areas** | Fixtures | Working | Flickering |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | **{}** | {} | {} | {} |\n\n",
        summary.well_lit,
        summary.poorly_lit,
        summary.areas,
        summary.total_fixtures,
        summary.working_fixtures,
        summary.flickering_fixtures
    ));

    let grouped = areas_by_status(areas);
    for (status, members) in &grouped {
        let names: Vec<&str> = members.iter().map(|a| a.area.as_str()).collect();
        section.push_str(&format!("**{}:** {}\n\n", status, names.join(", ")));
    }

    let darkest: Vec<_> = darkest_areas(areas, 5)
        .into_iter()
        .filter(|a| a.is_poorly_lit())
        .collect();
    if !darkest.is_empty() {
        section.push_str("### Darkest Areas\n\n");
        section.push_str("| Area | Working |\n");
        section.push_str("|:---|:---:|\n");
        for area in darkest {
            section.push_str(&format!(
                "| {} | {:.0}% |\n",
                area.area,
                area.working_percent()
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the per-area status table.
fn generate_area_table(areas: &[AreaStatus]) -> String {
    let mut section = String::new();

    section.push_str("## Area Status\n\n");

    if areas.is_empty() {
        section.push_str("No areas found in the data.\n\n");
        return section;
    }

    section.push_str("| Area | Status | Working | Total | Ratio | Flickering | Marker | Position |\n");
    section.push_str("|:---|:---|:---:|:---:|:---:|:---:|:---:|:---|\n");

    for area in areas {
        section.push_str(&generate_area_row(area));
    }
    section.push('\n');

    section
}

/// Generate a single area table row.
fn generate_area_row(area: &AreaStatus) -> String {
    let position = area
        .position
        .map(|p| p.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    format!(
        "| {} | {} {} | {} | {} | {:.2} | {} | {} | {} |\n",
        area.area,
        area.status.emoji(),
        area.status,
        area.working_count,
        area.total_count,
        area.lighting_ratio,
        area.flickering_count,
        area.status.marker_color(),
        position
    )
}

/// Generate the data quality section.
fn generate_data_quality_section(warnings: &[DataWarning], areas: &[AreaStatus]) -> String {
    let unlocated = unlocated_areas(areas);

    if warnings.is_empty() && unlocated.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Data Quality\n\n");

    if !unlocated.is_empty() {
        section.push_str("Areas without coordinates (excluded from proximity alerts):\n\n");
        for area in unlocated {
            section.push_str(&format!("- {}\n", area.area));
        }
        section.push('\n');
    }

    if !warnings.is_empty() {
        section.push_str("| Row | Problem |\n");
        section.push_str("|:---:|:---|\n");
        for warning in warnings {
            section.push_str(&format!("| {} | {} |\n", warning.row, warning.kind));
        }
        section.push('\n');
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by streetlight-watch*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
