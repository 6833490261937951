//! Error types for tasks
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, bad config, malformed store)
//! - 4: Operation failed (I/O, lock, CSV syntax)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the tasks CLI
pub mod exit_codes {
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for task store operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Task not found: {0}")]
    TaskNotFound(u64),

    #[error("Malformed store {path}: {reason}")]
    MalformedStore { path: PathBuf, reason: String },

    #[error("Corrupt record at row {row}: {reason}")]
    CorruptRecord { row: usize, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::InvalidInput(_)
            | Error::TaskNotFound(_)
            | Error::MalformedStore { .. }
            | Error::CorruptRecord { .. }
            | Error::InvalidConfig(_)
            | Error::TomlParse(_) => exit_codes::USER_ERROR,

            // Operation failures
            Error::Io(_)
            | Error::Csv(_)
            | Error::Json(_)
            | Error::LockFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::TaskNotFound(id) => Some(serde_json::json!({ "id": id })),
            Error::MalformedStore { path, .. } => {
                Some(serde_json::json!({ "path": path.display().to_string() }))
            }
            Error::CorruptRecord { row, .. } => Some(serde_json::json!({ "row": row })),
            Error::LockFailed(path) => {
                Some(serde_json::json!({ "path": path.display().to_string() }))
            }
            _ => None,
        }
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io(err.error)
    }
}

/// Result type alias for task store operations
pub type Result<T> = std::result::Result<T, Error>;
