//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup, the replicate runs and report
//! output.

use std::path::PathBuf;

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: apis_core::config::ConfigError,
    },

    /// A replicate failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: apis_core::runner::RunnerError,
    },

    /// The report file could not be written.
    #[error("failed to write report to {path}: {source}")]
    Output {
        /// Destination of the report.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The report could not be serialized.
    #[error("failed to serialize report: {source}")]
    Json {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
