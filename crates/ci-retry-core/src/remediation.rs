//! Remediation executor seam and the decision engine that drives it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classifier::Decision;
use crate::env_file::EnvFile;
use crate::error::Result;
use crate::signature::{RemediationTier, SignatureProfile};

// ---------------------------------------------------------------------------
// Executor trait
// ---------------------------------------------------------------------------

/// Side effects performed before a retry.
///
/// Implementations touch the filesystem or spawn processes; the engine only
/// decides which one to call.
#[async_trait]
pub trait Remediator: Send + Sync {
    /// Clear Xcode derived data.
    async fn clear_derived_data(&self) -> Result<()>;

    /// Clear and regenerate the tuist build cache.
    async fn clear_build_cache(&self) -> Result<()>;

    /// Run the action for `tier`. `RetryOnly` has no side effect.
    async fn remediate(&self, tier: RemediationTier) -> Result<()> {
        match tier {
            RemediationTier::ClearDerivedData => self.clear_derived_data().await,
            RemediationTier::ClearBuildCache => self.clear_build_cache().await,
            RemediationTier::RetryOnly => Ok(()),
        }
    }
}

#[async_trait]
impl<T: Remediator + ?Sized> Remediator for &T {
    async fn clear_derived_data(&self) -> Result<()> {
        (**self).clear_derived_data().await
    }

    async fn clear_build_cache(&self) -> Result<()> {
        (**self).clear_build_cache().await
    }

    async fn remediate(&self, tier: RemediationTier) -> Result<()> {
        (**self).remediate(tier).await
    }
}

/// Logs the action that would run without touching anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRemediator;

#[async_trait]
impl Remediator for DryRunRemediator {
    async fn clear_derived_data(&self) -> Result<()> {
        info!("dry run: would clear Xcode derived data");
        Ok(())
    }

    async fn clear_build_cache(&self) -> Result<()> {
        info!("dry run: would clear and regenerate tuist cache");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// What the engine did for one decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineOutcome {
    pub decision: Decision,

    /// Remediation ran and reported success.
    pub remediated: bool,

    /// `RETRY_BUILD=true` was appended to the env file.
    pub flag_written: bool,
}

/// Human-readable line announcing a decision, `None` for `NoAction`.
///
/// The legacy profile keeps its single wording for every match.
pub fn announcement(decision: &Decision, profile: SignatureProfile) -> Option<String> {
    let Decision::Remediate { tier, signature, .. } = decision else {
        return None;
    };
    if profile == SignatureProfile::Legacy {
        return Some(format!("Found known build error: {}", signature));
    }
    let line = match tier {
        RemediationTier::ClearDerivedData => {
            format!("Found error that requires cleaning derived data: {}", signature)
        }
        RemediationTier::ClearBuildCache => {
            format!("Found error that requires clearing tuist cache: {}", signature)
        }
        RemediationTier::RetryOnly => {
            format!("Found build error that requires retry: {}", signature)
        }
    };
    Some(line)
}

/// Applies a [`Decision`]: remediate, then record the retry flag.
pub struct RetryEngine<R> {
    remediator: R,
    env_file: EnvFile,
    profile: SignatureProfile,
}

impl<R: Remediator> RetryEngine<R> {
    pub fn new(remediator: R, env_file: EnvFile) -> Self {
        Self {
            remediator,
            env_file,
            profile: SignatureProfile::default(),
        }
    }

    /// Announce decisions in the wording of `profile`.
    pub fn with_profile(mut self, profile: SignatureProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn remediator(&self) -> &R {
        &self.remediator
    }

    /// Execute the side effects for `decision`.
    ///
    /// A failed remediation is logged and does not prevent the retry flag.
    /// Only an env-file write failure is returned as an error.
    pub async fn apply(&self, decision: Decision) -> Result<EngineOutcome> {
        let Some(tier) = decision.tier() else {
            info!("no known build errors found");
            return Ok(EngineOutcome {
                decision,
                remediated: false,
                flag_written: false,
            });
        };

        if let Some(line) = announcement(&decision, self.profile) {
            println!("{}", line);
        }

        let remediated = match self.remediator.remediate(tier).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%tier, "remediation failed: {}", e);
                false
            }
        };

        let flag_written = self.env_file.write_retry_flag()?;

        Ok(EngineOutcome {
            decision,
            remediated,
            flag_written,
        })
    }
}
