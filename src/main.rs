//! # Surf Dash Entry Point
//!
//! Reads NOAA high/low predictions saved as JSON, builds the tide curve and
//! the daylight index for the configured place, and prints every good surf
//! window in the forecast, grouped by day. `--json` emits the windows in their
//! wire form instead, `--plot` adds a text chart of the curve.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local, Utc};
use clap::{ArgAction, Parser, ValueHint};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use surf_dash_lib::cache::TimedCache;
use surf_dash_lib::config::{Config, CONFIG_FILE};
use surf_dash_lib::daylight::DaylightIndex;
use surf_dash_lib::renderer::render_ascii;
use surf_dash_lib::scanner::WindowScanner;
use surf_dash_lib::spline::Spline;
use surf_dash_lib::sun::sun_events;
use surf_dash_lib::tide_data::{truncate_to, PredictionQuery, PredictionStore};
use surf_dash_lib::time_tricks::{group_by_day, trim_clock};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Find good surf windows in NOAA tide predictions", long_about = None)]
struct Cli {
    /// NOAA hilo predictions, as returned by the datagetter API
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    predictions: PathBuf,

    /// Configuration file
    #[arg(short, long, default_value = CONFIG_FILE, value_hint = ValueHint::FilePath)]
    config: PathBuf,

    /// Pretend the current time is this RFC 3339 timestamp
    #[arg(long)]
    start: Option<DateTime<FixedOffset>>,

    /// Lowest acceptable tide in feet (overrides the config)
    #[arg(long, allow_negative_numbers = true)]
    low: Option<f64>,

    /// Highest acceptable tide in feet (overrides the config)
    #[arg(long, allow_negative_numbers = true)]
    high: Option<f64>,

    /// Print windows as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Draw the tide curve below the windows
    #[arg(long, action = ArgAction::SetTrue)]
    plot: bool,

    /// Chart width in columns
    #[arg(long, default_value_t = 96)]
    columns: usize,

    /// Also write the tide curve segments as JSON
    #[arg(long, value_hint = ValueHint::FilePath)]
    spline_json: Option<PathBuf>,

    /// Write the effective configuration to --config and exit
    #[arg(long, action = ArgAction::SetTrue)]
    write_config: bool,

    /// Debug logging
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load_from_path(&cli.config);
    if cli.low.is_some() {
        config.scan.low_tide = cli.low;
    }
    if cli.high.is_some() {
        config.scan.high_tide = cli.high;
    }
    if cli.write_config {
        return config
            .save_to_path(&cli.config)
            .with_context(|| format!("writing {}", cli.config.display()));
    }

    let now = match cli.start {
        Some(t) => t.with_timezone(&Local),
        None => Local::now(),
    };

    // One load per run, so no sweeper.
    let store = PredictionStore::new(Arc::new(TimedCache::new(config.cache.ttl())));

    let query = PredictionQuery {
        begin: now.date_naive(),
        days: config.scan.forecast_days,
        station: config.station.id.clone(),
    };
    let anchors = store
        .load(&query, &Local, |url| {
            debug!(%url, path = %cli.predictions.display(), "reading predictions from file");
            Ok(fs::read(&cli.predictions)?)
        })
        .with_context(|| format!("loading predictions from {}", cli.predictions.display()))?;

    let horizon = config
        .scan
        .forecast()
        .and_then(|days| now.checked_add_signed(days))
        .with_context(|| format!("forecast_days = {} is out of range", config.scan.forecast_days))?;
    let limit = trim_clock(&horizon).with_timezone(&Utc);
    let spline = Spline::build(truncate_to(&anchors, limit)).context("building tide curve")?;

    let twilight = config.scan.twilight().with_context(|| {
        format!("twilight_minutes = {} is out of range", config.scan.twilight_minutes)
    })?;
    let step = config
        .scan
        .step()
        .with_context(|| format!("step_minutes = {} is out of range", config.scan.step_minutes))?;
    let daylight = match spline.domain() {
        Some((first, last)) => DaylightIndex::new(sun_events(first, last - first, &config.place)),
        None => {
            warn!(anchors = anchors.len(), "not enough predictions to build a tide curve");
            DaylightIndex::new(Vec::new())
        }
    }
    .with_twilight(twilight);
    for event in daylight.events() {
        debug!(%event, "sun event");
    }

    if let Some(path) = &cli.spline_json {
        let body = serde_json::to_string_pretty(&spline)?;
        fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), segments = spline.segments().len(), "wrote tide curve");
    }

    let scanner = WindowScanner::new(Local).with_step(step);
    let windows = scanner.scan(&spline, &daylight, config.scan.threshold_options());
    info!(station = %config.station.name, windows = windows.len(), "scanned forecast");

    if cli.json {
        for window in &windows {
            window.label_at(&Local, &now);
        }
        println!("{}", serde_json::to_string_pretty(&windows)?);
    } else if windows.is_empty() {
        println!(
            "No good surf windows at {} in the next {} days.",
            config.station.name, config.scan.forecast_days
        );
    } else {
        for group in group_by_day(windows.clone(), &Local) {
            println!("{}", group.date.format("%A %m/%d"));
            for window in &group.windows {
                println!(
                    "  {}, {}",
                    window.label_in(&Local, &now),
                    window.reasons().join(" and ")
                );
            }
        }
    }

    if cli.plot {
        println!();
        print!("{}", render_ascii(&spline, &daylight, &windows, cli.columns));
    }

    Ok(())
}
