//! Headless runner for the Precinct dispatch simulation.
//!
//! Loads configuration, initializes logging, runs one bounded shift with the
//! greedy dispatch policy, and writes the final state to the save file.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `precinct-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Resume from the save file if one exists, otherwise start a new session
//! 4. Run the shift until its time or tick limit
//! 5. Log the result and write the save file

mod error;
mod log_observer;

use std::path::Path;

use precinct_core::config::DispatchConfig;
use precinct_core::persistence;
use precinct_core::policy::GreedyPolicy;
use precinct_core::runner::{self, SessionBounds};
use precinct_core::session::DispatchSession;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::SimError;
use crate::log_observer::LogObserver;

const CONFIG_PATH: &str = "precinct-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, the session run, or the save fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration before logging so the configured level applies.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config file.
    init_logging(&config);
    info!(
        name = %config.session.name,
        seed = config.session.seed,
        from_file,
        "precinct-sim starting"
    );

    // 3. Resume or start fresh.
    let save_path = config.session.save_path.clone();
    let mut session = open_session(config, save_path.as_deref())?;
    info!(
        tick = session.tick(),
        now_ms = session.now_ms(),
        officers = session.pool_size(),
        active_reports = session.list_active_reports().len(),
        "Session ready"
    );

    // 4. Run the shift.
    let bounds = SessionBounds::from_config(&session.config().session);
    let mut policy = GreedyPolicy::new();
    let mut observer = LogObserver::new();
    let result = runner::run_session(&mut session, &mut policy, &mut observer, bounds)
        .map_err(SimError::from)?;

    // 5. Log results and persist.
    runner::log_session_end(&result, &session);
    info!(
        reports_generated = observer.reports_generated(),
        assignments = observer.assignments(),
        rejected_commands = observer.rejected_commands(),
        "Dispatch tallies"
    );

    if let Some(path) = save_path {
        let save = persistence::save_game(&session);
        persistence::write_save_file(Path::new(&path), &save).map_err(SimError::from)?;
        info!(path = %path, tick = save.tick, "Save written");
    }

    info!(
        end_reason = ?result.end_reason,
        score = session.current_score(),
        "precinct-sim shutdown complete"
    );

    Ok(())
}

/// Load `precinct-config.yaml` from the working directory.
///
/// Returns the configuration and whether it came from the file.
fn load_config() -> Result<(DispatchConfig, bool), SimError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        let config = DispatchConfig::from_file(config_path)?;
        Ok((config, true))
    } else {
        let mut config = DispatchConfig::default();
        config.session.apply_env_overrides();
        Ok((config, false))
    }
}

fn init_logging(config: &DispatchConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_err| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Restore from `save_path` when the file exists, otherwise start a new
/// session.
fn open_session(
    config: DispatchConfig,
    save_path: Option<&str>,
) -> Result<DispatchSession, SimError> {
    if let Some(path) = save_path.map(Path::new).filter(|p| p.exists()) {
        let save = persistence::read_save_file(path)?;
        info!(path = %path.display(), tick = save.tick, "Resuming from save");
        return Ok(DispatchSession::restore(config, &save)?);
    }
    Ok(DispatchSession::new(config)?)
}
