//! Shell-backed remediation: derived data and tuist cache clearing.

use std::path::Path;

use async_trait::async_trait;
use ci_retry_core::{Remediator, Result, RetryError};
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::RemediationConfig;

/// Performs remediation with real filesystem and process side effects.
#[derive(Debug, Clone, Default)]
pub struct ShellRemediator {
    config: RemediationConfig,
}

impl ShellRemediator {
    pub fn new(config: RemediationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RemediationConfig {
        &self.config
    }
}

async fn remove_dir_if_present(dir: &Path, label: &str) -> Result<()> {
    if !dir.exists() {
        info!("{} not found at {}", label, dir.display());
        return Ok(());
    }
    info!("clearing {} at {}", label, dir.display());
    tokio::fs::remove_dir_all(dir).await?;
    Ok(())
}

async fn run_status(mut command: Command, description: &str) -> Result<()> {
    let status = command.status().await?;
    if !status.success() {
        return Err(RetryError::Remediation(format!(
            "{} exited with status {}",
            description,
            status.code().unwrap_or(-1)
        )));
    }
    Ok(())
}

#[async_trait]
impl Remediator for ShellRemediator {
    async fn clear_derived_data(&self) -> Result<()> {
        let script = &self.config.derived_data_script;
        if script.is_file() {
            info!(script = %script.display(), "clearing Xcode derived data");
            return run_status(Command::new(script), &script.display().to_string()).await;
        }

        warn!(script = %script.display(), "derived data script not found");
        match &self.config.derived_data_dir {
            Some(dir) => remove_dir_if_present(dir, "derived data").await,
            None => Err(RetryError::Remediation(
                "no derived data script or directory configured".to_string(),
            )),
        }
    }

    async fn clear_build_cache(&self) -> Result<()> {
        for dir in &self.config.tuist_cache_dirs {
            remove_dir_if_present(dir, "tuist cache").await?;
        }

        let regenerate = self.config.regenerate_command.trim();
        if regenerate.is_empty() {
            return Ok(());
        }

        info!("regenerating tuist cache");
        let mut command = Command::new("sh");
        command.arg("-c").arg(regenerate);
        run_status(command, regenerate).await
    }
}
