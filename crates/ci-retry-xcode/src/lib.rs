//! ci-retry Xcode integration
//!
//! Provides the OS-facing half of ci-retry:
//! - Reads `.log` files and `.xcresult` bundles from a log directory
//! - Runs `xcresulttool` with a bounded timeout
//! - Clears derived data and tuist caches before a retry
//! - Wires both into the `check-build-errors` and `show-test-failures` flows

pub mod check;
pub mod config;
pub mod shell;
pub mod source;
pub mod test_failures;
pub mod xcresult;

// Re-export key types
pub use check::check_build_errors;
pub use config::{CheckConfig, RemediationConfig, ReportConfig, XcresultToolConfig};
pub use shell::ShellRemediator;
pub use source::{EntryKind, LogEntry, LogSource};
pub use test_failures::{gather_failures, render_report, show_test_failures};
pub use xcresult::XcresultTool;
