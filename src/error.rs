//! Run-level error types.

use thiserror::Error;

/// Errors that abort the whole run.
///
/// Per-case trouble never shows up here: a statement failing inside a
/// case is a classifiable outcome and stays in the report.
#[derive(Error, Debug)]
pub enum RunError {
    /// Settings file missing or malformed
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    /// Case sheet missing or unparseable
    #[error("case sheet error: {0}")]
    Source(#[from] csv::Error),

    /// Connection could not be established
    #[error("database error: {0}")]
    Db(#[from] postgres::Error),

    /// Sandbox process could not be started
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for run-level operations.
pub type RunResult<T> = Result<T, RunError>;
