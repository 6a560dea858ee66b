//! CI environment file writer (`$GITHUB_ENV`).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, RetryError};

/// Line appended when a retry is requested.
pub const RETRY_FLAG_LINE: &str = "RETRY_BUILD=true";

/// Append-only handle on the CI environment file.
///
/// An unconfigured path turns every write into a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    path: Option<PathBuf>,
}

impl EnvFile {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// An env file that is never written.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append `RETRY_BUILD=true`. Returns whether anything was written.
    pub fn write_retry_flag(&self) -> Result<bool> {
        self.append_line(RETRY_FLAG_LINE)
    }

    fn append_line(&self, line: &str) -> Result<bool> {
        let Some(path) = self.path.as_deref() else {
            debug!("env file not configured, skipping '{}'", line);
            return Ok(false);
        };

        let env_err = |source| RetryError::EnvFile {
            path: path.to_path_buf(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(env_err)?;
        writeln!(file, "{}", line).map_err(env_err)?;

        info!(path = %path.display(), "wrote {}", line);
        Ok(true)
    }
}
