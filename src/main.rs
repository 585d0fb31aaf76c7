//! Streetlight Watch - poorly-lit area detection and proximity alerts
//!
//! A CLI tool that aggregates per-fixture streetlight records into
//! well-lit and poorly-lit areas and warns when the user's position is
//! near the closest poorly-lit one.
//!
//! Exit codes:
//!   0 - Success (safe, or a warning without --fail-on-warning)
//!   1 - Runtime error (missing data, bad config, unreadable file, etc.)
//!   2 - Proximity warning raised with --fail-on-warning

mod analysis;
mod cli;
mod config;
mod loader;
mod models;
mod report;
mod session;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use loader::{FixtureLoader, LoaderConfig};
use models::{QueryContext, QueryPoint, Report, ReportMetadata};
use session::{LocationSource, SessionState};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("Streetlight Watch v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .streetlight.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the data file, column names, threshold, and fallback location.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete workflow. Returns exit code (0 or 2).
async fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    // Step 1: Load fixtures
    let data_path = config.data.path.clone().context(
        "No data file given. Pass --data <FILE> or set [data] path in .streetlight.toml",
    )?;

    let loader = FixtureLoader::new(data_path, LoaderConfig::from(&config.data));
    println!("📥 Loading fixtures: {}", loader.path().display());
    let loaded = loader
        .load()
        .with_context(|| format!("Failed to load {}", loader.path().display()))?;

    for warning in &loaded.warnings {
        warn!("Row {}: {}", warning.row, warning.kind);
    }

    // Step 2: Aggregate into areas
    let areas = analysis::aggregate(&loaded.fixtures);
    let summary = analysis::summarize(&areas);
    info!(
        "{} areas: {} well-lit, {} poorly-lit",
        summary.areas, summary.well_lit, summary.poorly_lit
    );

    // Step 3: Resolve the query point
    let mut session = SessionState::new();
    let source = location_source(&args);
    let timeout = Duration::from_secs(config.location.timeout_seconds);

    println!("📍 Requesting location...");
    let outcome = source.request(timeout).await;
    session.apply(&outcome);
    debug!("Location {}; map requested: {}", outcome, session.show_map);

    let (point, origin) = session.query_point(config.fallback_point());
    info!("Evaluating at {} ({})", point, origin);

    // Step 4: Proximity alert
    let threshold = config.alert.threshold_meters;
    let nearest = analysis::nearest_poorly_lit(&areas, point)?;
    let alert = analysis::evaluate(&areas, point, threshold)?;

    // Step 5: Build and write the report
    let report = Report {
        metadata: ReportMetadata {
            data_source: loader.path().display().to_string(),
            generated_at: Utc::now(),
            fixtures_loaded: loaded.fixtures.len(),
            rows_skipped: loaded.skipped_rows(),
            threshold_meters: threshold,
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        query: QueryContext { point, origin },
        summary: summary.clone(),
        areas,
        nearest,
        alert: alert.clone(),
        warnings: loaded.warnings,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = std::path::PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    println!("\n📊 Lighting Summary:");
    println!("   Areas: {}", summary.areas);
    println!(
        "   - 🟢 Well-lit: {} | 🔴 Poorly-lit: {} | Unlocated: {}",
        summary.well_lit, summary.poorly_lit, summary.unlocated
    );
    println!(
        "   Fixtures: {} ({} working)",
        summary.total_fixtures, summary.working_fixtures
    );
    println!("\n{}", alert);
    println!("\n✅ Report saved to: {}", output_path.display());

    if args.fail_on_warning && alert.is_warning() {
        eprintln!("\n⛔ Poorly-lit area within {:.0}m. Failing (exit code 2).", threshold);
        return Ok(2);
    }

    Ok(0)
}

/// Pick the location source from the command line.
fn location_source(args: &Args) -> LocationSource {
    match (args.lat, args.lng, &args.location_file) {
        (Some(lat), Some(lng), _) => LocationSource::Fixed(QueryPoint::new(lat, lng)),
        (_, _, Some(path)) => LocationSource::MessageFile(path.clone()),
        _ => LocationSource::Unavailable,
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
