//! Error types for ci-retry

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetryError {
    /// The top-level log directory does not exist.
    #[error("'{}' directory not found", .0.display())]
    LogDirMissing(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// External tool exited with a non-zero status.
    #[error("{program} exited with status {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: i32,
        stderr: String,
    },

    #[error("{program} timed out after {secs} seconds")]
    ToolTimeout { program: String, secs: u64 },

    #[error("Remediation failed: {0}")]
    Remediation(String),

    #[error("Failed to write env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for ci-retry operations
pub type Result<T> = std::result::Result<T, RetryError>;
