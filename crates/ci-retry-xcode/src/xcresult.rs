//! `xcresulttool` invocation with a bounded wait.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use ci_retry_core::{RetryError, Result, TestResults};
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::XcresultToolConfig;

/// Runs `xcresulttool` subcommands against a result bundle.
#[derive(Debug, Clone, Default)]
pub struct XcresultTool {
    config: XcresultToolConfig,
}

impl XcresultTool {
    pub fn new(config: XcresultToolConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &XcresultToolConfig {
        &self.config
    }

    /// Error summary messages from the legacy JSON export.
    pub async fn error_summaries(&self, bundle: &Path) -> Result<Vec<String>> {
        let path = bundle.to_string_lossy();
        let stdout = self
            .run(&["get", "--format", "json", "--path", &*path, "--legacy"])
            .await?;
        let data: Value = serde_json::from_str(&stdout)?;

        let messages = parse_error_summaries(&data);
        for message in &messages {
            info!(bundle = %bundle.display(), "found test error: {}", message);
        }
        Ok(messages)
    }

    /// Structured test tree for the failure report.
    pub async fn test_results(&self, bundle: &Path) -> Result<TestResults> {
        let path = bundle.to_string_lossy();
        let stdout = self
            .run(&["get", "test-results", "tests", "--path", &*path])
            .await?;
        Ok(serde_json::from_str(&stdout)?)
    }

    /// Spawn the tool and return its stdout.
    ///
    /// Non-zero exit and timeout are errors; the child is killed when the
    /// timeout elapses.
    async fn run(&self, args: &[&str]) -> Result<String> {
        let program = &self.config.program;
        debug!(program = %program, ?args, "running xcresulttool");

        let child = Command::new(program)
            .args(&self.config.base_args)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = if self.config.timeout_secs > 0 {
            tokio::time::timeout(
                Duration::from_secs(self.config.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| RetryError::ToolTimeout {
                program: program.clone(),
                secs: self.config.timeout_secs,
            })??
        } else {
            child.wait_with_output().await?
        };

        if !output.status.success() {
            return Err(RetryError::ToolFailed {
                program: program.clone(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Pull `issues.errorSummaries._values[*].message._value` out of the legacy export.
pub fn parse_error_summaries(data: &Value) -> Vec<String> {
    data["issues"]["errorSummaries"]["_values"]
        .as_array()
        .map(|values| {
            values
                .iter()
                .filter_map(|summary| summary["message"]["_value"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
