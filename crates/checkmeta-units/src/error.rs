//! Error types for the checkmeta-units crate.
//!
//! Loading external configuration data (trait catalog, statistic schema)
//! is the only fallible operation here; everything that runs during a
//! matchday reports problems as values instead.

/// Errors that can occur when loading a trait catalog or statistic schema.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Failed to read the file from disk.
    #[error("failed to read catalog file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse catalog YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        #[from]
        source: serde_yml::Error,
    },

    /// An entry parsed but is not usable.
    #[error("invalid catalog entry {entry}: {reason}")]
    Invalid {
        /// Identifier of the offending entry.
        entry: String,
        /// Description of the problem.
        reason: String,
    },
}
