//! Error types for the simulation binary.

/// Top-level error for `precinct-sim`.
///
/// Each variant wraps one subsystem error so `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: precinct_core::config::ConfigError,
    },

    /// Reading, restoring, or writing the save file failed.
    #[error("persistence error: {source}")]
    Persistence {
        /// The underlying persistence error.
        #[from]
        source: precinct_core::persistence::PersistenceError,
    },

    /// The session run failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: precinct_core::runner::RunnerError,
    },
}
