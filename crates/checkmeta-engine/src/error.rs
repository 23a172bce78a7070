//! Error types for the matchday driver binary.
//!
//! [`EngineError`] wraps every failure mode of startup: configuration,
//! the trait catalog, roster spawning, and the matchday itself.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Matchday configuration could not be loaded.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: checkmeta_core::config::ConfigError,
    },

    /// The trait catalog file could not be loaded.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: checkmeta_units::CatalogError,
    },

    /// The matchday could not be built or run.
    #[error("matchday error: {source}")]
    Matchday {
        /// The underlying matchday error.
        #[from]
        source: checkmeta_core::matchday::MatchdayError,
    },

    /// The `engine` config section is malformed.
    #[error("engine settings error: {message}")]
    Settings {
        /// Description of the problem.
        message: String,
    },

    /// The demo roster could not be spawned.
    #[error("roster error: {message}")]
    Roster {
        /// Description of the roster failure.
        message: String,
    },
}
