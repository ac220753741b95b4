//! Headless runner for the Litany economy.
//!
//! Loads configuration, builds an [`Engine`], and drives it at a fixed
//! frame rate with a simple built-in play policy. When the run ends the
//! final state is printed to stdout as a JSON snapshot, so a run can be
//! inspected or fed back in as a save.
//!
//! # Usage
//!
//! ```text
//! litany-engine [CONFIG] [SECONDS]
//! ```
//!
//! `CONFIG` defaults to `litany-config.yaml` when that file exists and to
//! built-in defaults otherwise. `SECONDS` is simulated time, default 600.
//!
//! # Startup Sequence
//!
//! 1. Load configuration
//! 2. Initialize structured logging (tracing)
//! 3. Build the engine and attach the tracing listener
//! 4. Run the frame loop
//! 5. Print the snapshot and log the result

mod strategy;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use litany_core::{Engine, EngineConfig, TracingListener};
use litany_types::Resource;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::strategy::Autoplayer;

/// Config file picked up from the working directory.
const DEFAULT_CONFIG_PATH: &str = "litany-config.yaml";

/// Simulated seconds when none are given.
const DEFAULT_RUN_SECONDS: f64 = 600.0;

/// Seconds per frame.
const FRAME_SECONDS: f64 = 0.25;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if arguments or configuration are invalid, or if the
/// engine refuses a frame.
fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().map(PathBuf::from);
    let seconds = match args.next() {
        Some(raw) => raw
            .parse::<f64>()
            .with_context(|| format!("invalid run length: {raw}"))?,
        None => DEFAULT_RUN_SECONDS,
    };
    if !(seconds.is_finite() && seconds >= 0.0) {
        bail!("run length must be a non-negative number of seconds, got {seconds}");
    }

    // 1. Load configuration. Logging is not up yet, so report the source
    //    after initialization.
    let (config, source) = load_config(config_path.as_deref())?;

    // 2. Initialize structured logging.
    init_tracing(&config);
    info!(config = %source, seed = ?config.world.seed, seconds, "litany-engine starting");

    // 3. Build the engine.
    let mut engine = Engine::from_config(config)?;
    engine.subscribe(TracingListener);

    // 4. Run the frame loop.
    let mut player = Autoplayer::new();
    let mut elapsed = 0.0;
    while elapsed < seconds {
        let dt = FRAME_SECONDS.min(seconds - elapsed);
        engine.tick(dt)?;
        player.act(&mut engine, dt);
        elapsed += dt;
    }

    // 5. Report.
    let snapshot = engine.export();
    println!("{}", snapshot.to_json()?);

    let tally = player.tally();
    let calendar = engine.calendar();
    info!(
        ticks = snapshot.ticks,
        day = calendar.day_in_season,
        season = %calendar.season,
        insight = engine.amount(Resource::Insight),
        word = engine.amount(Resource::Word),
        crafts = tally.crafts,
        rejections = tally.rejections,
        upgrades = tally.upgrades,
        followers = tally.followers,
        recruit_rolls = tally.recruit_rolls,
        memory_slots = engine.memory_slots(),
        "Run complete"
    );
    Ok(())
}

/// Load configuration from `path`, or from [`DEFAULT_CONFIG_PATH`] when it
/// exists, or fall back to defaults. Returns the config and a label for
/// where it came from.
fn load_config(path: Option<&Path>) -> anyhow::Result<(EngineConfig, String)> {
    if let Some(path) = path {
        let config = EngineConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?;
        return Ok((config, path.display().to_string()));
    }
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        let config = EngineConfig::from_file(default_path)
            .with_context(|| format!("loading {DEFAULT_CONFIG_PATH}"))?;
        Ok((config, DEFAULT_CONFIG_PATH.to_owned()))
    } else {
        Ok((EngineConfig::default(), "defaults".to_owned()))
    }
}

/// `RUST_LOG` wins; otherwise the configured level is used.
fn init_tracing(config: &EngineConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
