//! In-memory fakes for the remediation seam (testing only)

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, RetryError};
use crate::remediation::Remediator;
use crate::signature::RemediationTier;

/// Records every remediation request instead of executing it.
#[derive(Debug, Default)]
pub struct RecordingRemediator {
    calls: Mutex<Vec<RemediationTier>>,
    fail: bool,
}

impl RecordingRemediator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A remediator whose actions are recorded and then fail.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Tiers requested so far, in call order.
    pub fn calls(&self) -> Vec<RemediationTier> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, tier: RemediationTier) -> Result<()> {
        self.calls.lock().unwrap().push(tier);
        if self.fail {
            return Err(RetryError::Remediation(format!("{} failed", tier)));
        }
        Ok(())
    }
}

#[async_trait]
impl Remediator for RecordingRemediator {
    async fn clear_derived_data(&self) -> Result<()> {
        self.record(RemediationTier::ClearDerivedData)
    }

    async fn clear_build_cache(&self) -> Result<()> {
        self.record(RemediationTier::ClearBuildCache)
    }
}
