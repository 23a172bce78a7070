//! Matchday driver binary for checkMeta.
//!
//! Wires a demo roster, the opening-book oracle, and the matchday
//! orchestrator together, runs one matchday to completion, and writes the
//! result object as JSON to stdout. Logs go to stderr.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (first argument, else `checkmeta-config.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Load the trait catalog
//! 4. Spawn the demo roster from the matchday seed
//! 5. Build the matchday with the book oracle
//! 6. Run it under a [`MatchdayControl`] that Ctrl-C stops
//! 7. Print the result

mod book_oracle;
mod error;
mod progress;
mod roster;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use checkmeta_core::config::MatchdayConfig;
use checkmeta_core::control::MatchdayControl;
use checkmeta_core::dice::Dice;
use checkmeta_core::matchday::MatchdayBuilder;
use checkmeta_core::runner;
use checkmeta_units::TraitCatalog;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::book_oracle::BookOracle;
use crate::error::EngineError;
use crate::progress::ProgressCallback;
use crate::roster::EngineSettings;

/// Config file looked up in the working directory when no path is given.
const DEFAULT_CONFIG: &str = "checkmeta-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, roster spawning, or the matchday
/// itself fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let (config, settings) = load_config(config_path.as_deref())?;

    // 2. Initialize structured logging on stderr; stdout carries the result.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        seed = config.matchday.seed,
        max_turns = config.matchday.max_turns,
        worker_threads = config.matchday.worker_threads,
        turn_interval_ms = config.matchday.turn_interval_ms,
        "Configuration loaded"
    );

    // 3. Trait catalog.
    let catalog = match &settings.trait_catalog {
        Some(path) => TraitCatalog::from_file(path)
            .map_err(EngineError::from)
            .with_context(|| format!("loading trait catalog {}", path.display()))?,
        None => TraitCatalog::builtin(),
    };
    info!(traits = catalog.len(), "Trait catalog loaded");

    // 4. Demo roster.
    let mut roster_dice = Dice::seeded(config.matchday.seed).fork("roster");
    let units = roster::spawn_roster(&settings, &config.resources, &catalog, &mut roster_dice)?;

    // 5. Matchday.
    let control = Arc::new(MatchdayControl::new(config.matchday.turn_interval_ms));
    let matchday = MatchdayBuilder::new(config)
        .oracle(Arc::new(BookOracle::new(settings.game_length)))
        .catalog(Arc::new(catalog))
        .units(units)
        .build()
        .map_err(EngineError::from)?;

    // 6. Ctrl-C requests cancellation at the next turn boundary.
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping at the next turn boundary");
                control.request_stop();
            }
        });
    }

    let mut progress = ProgressCallback::new();
    let result = runner::run_matchday(matchday, &control, &mut progress)
        .await
        .map_err(EngineError::from)?;

    // 7. Result.
    let json = result.to_json().context("serializing matchday result")?;
    println!("{json}");

    info!(
        end_reason = ?result.end_reason,
        turns = result.turns_played,
        convergences = progress.convergences(),
        "checkmeta-engine shutdown complete"
    );
    Ok(())
}

/// Load the matchday configuration and the driver's `engine` section.
///
/// An explicit path must exist. Without one, `checkmeta-config.yaml` in
/// the working directory is used if present, otherwise defaults (with
/// environment overrides still applied).
fn load_config(path: Option<&Path>) -> Result<(MatchdayConfig, EngineSettings), EngineError> {
    let path = match path {
        Some(path) => Some(path),
        None => Some(Path::new(DEFAULT_CONFIG)).filter(|p| p.exists()),
    };
    let Some(path) = path else {
        let mut config = MatchdayConfig::default();
        config.apply_env_overrides();
        return Ok((config, EngineSettings::default()));
    };

    let config = MatchdayConfig::from_file(path)?;
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Settings {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    let settings = EngineSettings::from_yaml(&contents)?;
    Ok((config, settings))
}
