//! Log directory enumeration and artifact loading.

use std::path::{Path, PathBuf};

use ci_retry_core::{LogArtifact, Result, RetryError, SignatureProfile};
use tracing::{debug, warn};

use crate::xcresult::XcresultTool;

const BUNDLE_EXTENSION: &str = ".xcresult";

/// Kind of a scannable directory entry, decided by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Plain-text build log.
    BuildLog,
    /// `.xcresult` test result bundle.
    ResultBundle,
}

impl EntryKind {
    /// Log names follow `profile`; bundles always need the `.xcresult` suffix.
    pub fn from_file_name(name: &str, profile: SignatureProfile) -> Option<Self> {
        if profile.is_build_log(name) {
            Some(EntryKind::BuildLog)
        } else if name.ends_with(BUNDLE_EXTENSION) {
            Some(EntryKind::ResultBundle)
        } else {
            None
        }
    }
}

/// A scannable entry of the log directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl LogEntry {
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Reads build logs and result bundles from one directory.
#[derive(Debug, Clone)]
pub struct LogSource {
    dir: PathBuf,
    profile: SignatureProfile,
}

impl LogSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            profile: SignatureProfile::default(),
        }
    }

    /// Select build logs by the naming rule of `profile`.
    pub fn with_profile(mut self, profile: SignatureProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Recognised entries, sorted by file name.
    ///
    /// Fails only when the directory itself is missing or unreadable.
    pub fn entries(&self) -> Result<Vec<LogEntry>> {
        if !self.dir.is_dir() {
            return Err(RetryError::LogDirMissing(self.dir.clone()));
        }

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            match EntryKind::from_file_name(&name, self.profile) {
                Some(kind) => entries.push(LogEntry {
                    path: entry.path(),
                    kind,
                }),
                None => debug!("ignoring {}", name),
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Result bundles only.
    pub fn bundles(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| e.kind == EntryKind::ResultBundle)
            .map(|e| e.path)
            .collect())
    }

    /// Load every entry as a [`LogArtifact`].
    ///
    /// Unreadable logs and failed bundle extractions are logged and skipped.
    /// With `tool == None` bundles are not scanned.
    pub async fn artifacts(&self, tool: Option<&XcresultTool>) -> Result<Vec<LogArtifact>> {
        let mut artifacts = Vec::new();

        for entry in self.entries()? {
            let name = entry.name();
            match entry.kind {
                EntryKind::BuildLog => match tokio::fs::read(&entry.path).await {
                    Ok(bytes) => {
                        let text = String::from_utf8_lossy(&bytes).to_string();
                        artifacts.push(LogArtifact::text(name, text));
                    }
                    Err(e) => warn!(path = %entry.path.display(), "failed to read log: {}", e),
                },
                EntryKind::ResultBundle => {
                    let Some(tool) = tool else {
                        debug!("skipping result bundle {}", name);
                        continue;
                    };
                    match tool.error_summaries(&entry.path).await {
                        Ok(messages) => artifacts.push(LogArtifact::messages(name, messages)),
                        Err(e) => warn!(
                            path = %entry.path.display(),
                            "error processing result bundle: {}", e
                        ),
                    }
                }
            }
        }

        Ok(artifacts)
    }
}
