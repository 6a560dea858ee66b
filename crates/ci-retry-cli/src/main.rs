//! ci-retry CLI
//!
//! Triage helpers for flaky Xcode CI runs.
//!
//! ## Commands
//!
//! - `check-build-errors`: scan `log/` for known transient failures, clear
//!   caches when needed and write `RETRY_BUILD=true` to `$GITHUB_ENV`
//! - `show-test-failures`: print GitHub annotations and a summary for every
//!   failed test in the `.xcresult` bundles
//!
//! Both commands exit 0 on every handled path so the workflow decides what
//! to do with the outputs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ci_retry_core::{DryRunRemediator, EngineOutcome, RetryError, SignatureProfile};
use ci_retry_xcode::config::{DEFAULT_LOG_DIR, DEFAULT_TOOL_TIMEOUT_SECS};
use ci_retry_xcode::{
    check_build_errors, show_test_failures, CheckConfig, RemediationConfig, ReportConfig,
    ShellRemediator, XcresultToolConfig,
};
use clap::{Parser, Subcommand};
use tracing::{error, info, Level};

#[derive(Parser)]
#[command(name = "ci-retry")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Retry triage for Xcode CI builds", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether the build should be retried
    CheckBuildErrors {
        /// Directory holding .log files and .xcresult bundles
        #[arg(long, default_value = DEFAULT_LOG_DIR)]
        log_dir: PathBuf,

        /// CI environment file the retry flag is appended to
        #[arg(long, env = "GITHUB_ENV")]
        github_env: Option<PathBuf>,

        /// Signature table to match against (shared or legacy)
        #[arg(long, default_value = "shared")]
        profile: SignatureProfile,

        /// Seconds to wait for each xcresulttool call
        #[arg(long, default_value_t = DEFAULT_TOOL_TIMEOUT_SECS)]
        timeout_secs: u64,

        /// Script that clears Xcode derived data
        #[arg(long)]
        derived_data_script: Option<PathBuf>,

        /// Log remediation steps instead of running them
        #[arg(long)]
        dry_run: bool,

        /// Write the decision as JSON to this path
        #[arg(long)]
        decision_file: Option<PathBuf>,
    },

    /// Print annotations and a summary for failed tests
    ShowTestFailures {
        /// Result bundle to inspect instead of scanning the log directory
        xcresult: Option<PathBuf>,

        /// Directory scanned for .xcresult bundles
        #[arg(long, default_value = DEFAULT_LOG_DIR)]
        log_dir: PathBuf,

        /// Seconds to wait for each xcresulttool call
        #[arg(long, default_value_t = DEFAULT_TOOL_TIMEOUT_SECS)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    ci_retry_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::CheckBuildErrors {
            log_dir,
            github_env,
            profile,
            timeout_secs,
            derived_data_script,
            dry_run,
            decision_file,
        } => {
            let mut remediation = RemediationConfig::default();
            if let Some(script) = derived_data_script {
                remediation.derived_data_script = script;
            }
            let config = CheckConfig {
                log_dir,
                env_file: github_env,
                profile,
                tool: XcresultToolConfig {
                    timeout_secs,
                    ..Default::default()
                },
                remediation,
            };
            cmd_check_build_errors(&config, dry_run, decision_file.as_deref()).await
        }
        Commands::ShowTestFailures {
            xcresult,
            log_dir,
            timeout_secs,
        } => {
            let config = ReportConfig {
                log_dir,
                bundle: xcresult,
                tool: XcresultToolConfig {
                    timeout_secs,
                    ..Default::default()
                },
            };
            cmd_show_test_failures(&config).await
        }
    }
}

async fn cmd_check_build_errors(
    config: &CheckConfig,
    dry_run: bool,
    decision_file: Option<&Path>,
) -> Result<()> {
    let result = if dry_run {
        check_build_errors(config, DryRunRemediator).await
    } else {
        check_build_errors(config, ShellRemediator::new(config.remediation.clone())).await
    };

    match result {
        Ok(outcome) => {
            info!(
                retry = outcome.decision.requires_retry(),
                remediated = outcome.remediated,
                flag_written = outcome.flag_written,
                "check complete"
            );
            if let Some(path) = decision_file {
                if let Err(e) = write_decision(path, &outcome) {
                    error!("{:#}", e);
                }
            }
        }
        Err(RetryError::LogDirMissing(dir)) => {
            let cwd = std::env::current_dir().unwrap_or_default();
            println!(
                "Error: '{}' directory not found in {}",
                dir.display(),
                cwd.display()
            );
        }
        Err(e) => error!("build error check failed: {}", e),
    }
    Ok(())
}

fn write_decision(path: &Path, outcome: &EngineOutcome) -> Result<()> {
    let json = serde_json::to_string_pretty(outcome).context("Failed to serialize decision")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write decision to {}", path.display()))?;
    Ok(())
}

async fn cmd_show_test_failures(config: &ReportConfig) -> Result<()> {
    let failures = show_test_failures(config).await;
    info!(failures = failures.len(), "test failure report complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check_defaults() {
        let cli = Cli::try_parse_from(["ci-retry", "check-build-errors"]).unwrap();
        match cli.command {
            Commands::CheckBuildErrors {
                log_dir,
                profile,
                timeout_secs,
                dry_run,
                ..
            } => {
                assert_eq!(log_dir, PathBuf::from("log"));
                assert_eq!(profile, SignatureProfile::Shared);
                assert_eq!(timeout_secs, 60);
                assert!(!dry_run);
            }
            _ => panic!("expected check-build-errors"),
        }
    }

    #[test]
    fn test_parse_check_legacy_profile() {
        let cli = Cli::try_parse_from([
            "ci-retry",
            "check-build-errors",
            "--profile",
            "legacy",
            "--github-env",
            "/tmp/env",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::CheckBuildErrors {
                profile,
                github_env,
                dry_run,
                ..
            } => {
                assert_eq!(profile, SignatureProfile::Legacy);
                assert_eq!(github_env, Some(PathBuf::from("/tmp/env")));
                assert!(dry_run);
            }
            _ => panic!("expected check-build-errors"),
        }
    }

    #[test]
    fn test_parse_unknown_profile_fails() {
        assert!(Cli::try_parse_from(["ci-retry", "check-build-errors", "--profile", "nope"]).is_err());
    }

    #[test]
    fn test_parse_show_with_bundle() {
        let cli =
            Cli::try_parse_from(["ci-retry", "-v", "show-test-failures", "Tests.xcresult"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::ShowTestFailures { xcresult, .. } => {
                assert_eq!(xcresult, Some(PathBuf::from("Tests.xcresult")));
            }
            _ => panic!("expected show-test-failures"),
        }
    }

    #[tokio::test]
    async fn test_missing_log_dir_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join("env");
        let config = CheckConfig {
            log_dir: dir.path().join("log"),
            env_file: Some(env_path.clone()),
            ..Default::default()
        };

        cmd_check_build_errors(&config, true, None).await.unwrap();
        assert!(!env_path.exists());
    }

    #[tokio::test]
    async fn test_unwritable_decision_file_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("log");
        std::fs::create_dir(&log_dir).unwrap();
        std::fs::write(log_dir.join("build.log"), "clang: Segmentation fault").unwrap();
        let env_path = dir.path().join("env");
        let decision_path = dir.path().join("no-such-dir").join("decision.json");

        let config = CheckConfig {
            log_dir,
            env_file: Some(env_path.clone()),
            ..Default::default()
        };
        cmd_check_build_errors(&config, true, Some(&decision_path))
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&env_path).unwrap(),
            "RETRY_BUILD=true\n"
        );
        assert!(!decision_path.exists());
    }

    #[tokio::test]
    async fn test_decision_file_written() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("log");
        std::fs::create_dir(&log_dir).unwrap();
        std::fs::write(log_dir.join("build.log"), "ld: symbol(s) not found").unwrap();
        let decision_path = dir.path().join("decision.json");

        let config = CheckConfig {
            log_dir,
            env_file: None,
            ..Default::default()
        };
        cmd_check_build_errors(&config, true, Some(&decision_path))
            .await
            .unwrap();

        let outcome: EngineOutcome =
            serde_json::from_str(&std::fs::read_to_string(&decision_path).unwrap()).unwrap();
        assert_eq!(
            outcome.decision.tier(),
            Some(ci_retry_core::RemediationTier::ClearDerivedData)
        );
    }
}
