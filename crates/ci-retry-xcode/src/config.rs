//! Configuration for the check and report pipelines.

use std::path::PathBuf;

use ci_retry_core::SignatureProfile;
use serde::{Deserialize, Serialize};

/// Default directory scanned for `.log` files and `.xcresult` bundles.
pub const DEFAULT_LOG_DIR: &str = "log";

/// Default bound on a single `xcresulttool` call.
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;

/// How `xcresulttool` is invoked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct XcresultToolConfig {
    /// Executable to spawn.
    pub program: String,

    /// Arguments placed before the subcommand arguments.
    pub base_args: Vec<String>,

    /// Timeout in seconds (0 = wait forever).
    pub timeout_secs: u64,
}

impl Default for XcresultToolConfig {
    fn default() -> Self {
        Self {
            program: "xcrun".to_string(),
            base_args: vec!["xcresulttool".to_string()],
            timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
        }
    }
}

impl XcresultToolConfig {
    /// Use a custom executable with no base arguments.
    pub fn custom(program: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            timeout_secs,
        }
    }
}

/// Cache-clearing side effects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemediationConfig {
    /// Script that clears Xcode derived data. Relative paths resolve
    /// against the working directory.
    pub derived_data_script: PathBuf,

    /// Removed directly when the script is not present.
    pub derived_data_dir: Option<PathBuf>,

    /// Tuist cache directories removed before regeneration.
    pub tuist_cache_dirs: Vec<PathBuf>,

    /// Shell command that regenerates the tuist cache (empty = skip).
    pub regenerate_command: String,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        let home = dirs::home_dir();
        let mut tuist_cache_dirs = Vec::new();
        if let Some(home) = &home {
            tuist_cache_dirs.push(home.join(".cache").join("tuist"));
        }
        tuist_cache_dirs.push(PathBuf::from("Tuist/.build"));

        Self {
            derived_data_script: PathBuf::from("scripts/clear-xcode-derived-data.sh"),
            derived_data_dir: home.map(|h| h.join("Library/Developer/Xcode/DerivedData")),
            tuist_cache_dirs,
            regenerate_command: "tuist install && tuist cache && tuist generate --no-open"
                .to_string(),
        }
    }
}

/// Settings for `check-build-errors`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckConfig {
    pub log_dir: PathBuf,

    /// CI environment file (`$GITHUB_ENV`); `None` disables the flag write.
    pub env_file: Option<PathBuf>,

    pub profile: SignatureProfile,

    pub tool: XcresultToolConfig,

    pub remediation: RemediationConfig,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            env_file: None,
            profile: SignatureProfile::default(),
            tool: XcresultToolConfig::default(),
            remediation: RemediationConfig::default(),
        }
    }
}

/// Settings for `show-test-failures`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportConfig {
    pub log_dir: PathBuf,

    /// Explicit bundle; takes precedence over the log directory when it
    /// ends in `.xcresult`.
    pub bundle: Option<PathBuf>,

    pub tool: XcresultToolConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            bundle: None,
            tool: XcresultToolConfig::default(),
        }
    }
}
