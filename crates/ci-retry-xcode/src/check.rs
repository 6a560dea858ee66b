//! `check-build-errors`: scan logs, decide, remediate, flag a retry.

use ci_retry_core::{
    classify, EngineOutcome, EnvFile, Remediator, Result, RetryEngine, SignatureTable,
};
use tracing::info;

use crate::config::CheckConfig;
use crate::source::LogSource;
use crate::xcresult::XcresultTool;

/// Run the whole check against `config`, remediating through `remediator`.
///
/// Returns `RetryError::LogDirMissing` without writing any flag when the log
/// directory does not exist. Per-artifact failures never abort the scan.
pub async fn check_build_errors<R: Remediator>(
    config: &CheckConfig,
    remediator: R,
) -> Result<EngineOutcome> {
    let table = SignatureTable::for_profile(config.profile);
    let source = LogSource::new(&config.log_dir).with_profile(config.profile);

    let tool = XcresultTool::new(config.tool.clone());
    let tool = config.profile.scans_result_bundles().then_some(&tool);

    let artifacts = source.artifacts(tool).await?;
    info!(
        profile = %config.profile,
        artifacts = artifacts.len(),
        "scanned {}",
        source.dir().display()
    );

    let decision = classify(&table, &artifacts);
    let engine = RetryEngine::new(remediator, EnvFile::new(config.env_file.clone()))
        .with_profile(config.profile);
    engine.apply(decision).await
}
