//! Known error signatures and the remediation tier each one maps to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Corrective action class, declared in priority order (highest first).
///
/// `Ord` follows declaration order, so `ClearDerivedData < ClearBuildCache`
/// means "checked earlier", not "less important".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RemediationTier {
    /// Linker failures caused by stale Xcode derived data.
    ClearDerivedData,

    /// Corrupted tuist build cache.
    ClearBuildCache,

    /// Transient failure; a plain retry is enough.
    RetryOnly,
}

impl RemediationTier {
    /// All tiers in the order they are evaluated.
    pub const PRIORITY: [RemediationTier; 3] = [
        RemediationTier::ClearDerivedData,
        RemediationTier::ClearBuildCache,
        RemediationTier::RetryOnly,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RemediationTier::ClearDerivedData => "clear_derived_data",
            RemediationTier::ClearBuildCache => "clear_build_cache",
            RemediationTier::RetryOnly => "retry_only",
        }
    }
}

impl fmt::Display for RemediationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A literal, case-sensitive substring tied to one tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorSignature {
    pub pattern: String,
    pub tier: RemediationTier,
}

impl ErrorSignature {
    pub fn new(pattern: impl Into<String>, tier: RemediationTier) -> Self {
        Self {
            pattern: pattern.into(),
            tier,
        }
    }

    /// Whether this signature occurs anywhere in `text`.
    pub fn matches(&self, text: &str) -> bool {
        text.contains(self.pattern.as_str())
    }
}

/// Named signature lists that have been used across CI pipelines.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignatureProfile {
    /// Full table: derived data, tuist cache, and retry-only signatures.
    #[default]
    Shared,

    /// Older app-build table: two retry-only signatures, `.log` files only.
    Legacy,
}

impl SignatureProfile {
    pub fn name(&self) -> &'static str {
        match self {
            SignatureProfile::Shared => "shared",
            SignatureProfile::Legacy => "legacy",
        }
    }

    /// Whether structured `.xcresult` bundles are scanned under this profile.
    pub fn scans_result_bundles(&self) -> bool {
        matches!(self, SignatureProfile::Shared)
    }

    /// Whether `file_name` is read as a plain build log.
    ///
    /// The legacy table accepted any name containing `.log`, e.g. `build.log.txt`.
    pub fn is_build_log(&self, file_name: &str) -> bool {
        match self {
            SignatureProfile::Shared => file_name.ends_with(".log"),
            SignatureProfile::Legacy => file_name.contains(".log"),
        }
    }
}

impl fmt::Display for SignatureProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SignatureProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shared" => Ok(SignatureProfile::Shared),
            "legacy" => Ok(SignatureProfile::Legacy),
            other => Err(format!(
                "unknown signature profile '{}' (expected 'shared' or 'legacy')",
                other
            )),
        }
    }
}

/// Ordered, data-driven signature table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SignatureTable {
    signatures: Vec<ErrorSignature>,
}

impl SignatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table for a named profile.
    pub fn for_profile(profile: SignatureProfile) -> Self {
        match profile {
            SignatureProfile::Shared => Self::shared(),
            SignatureProfile::Legacy => Self::legacy(),
        }
    }

    pub fn shared() -> Self {
        Self::new()
            .with(RemediationTier::ClearDerivedData, "ld: symbol(s) not found")
            // Whether these two belong to the cache tier is still unconfirmed;
            // the legacy table never matched them at all.
            .with(RemediationTier::ClearBuildCache, "Underlying Error: Crash")
            .with(RemediationTier::ClearBuildCache, "Failed to load the test bundle")
            .with(RemediationTier::RetryOnly, "The Xcode build system has crashed")
            .with(
                RemediationTier::RetryOnly,
                "Command CodeSign failed with a nonzero exit code",
            )
            .with(
                RemediationTier::RetryOnly,
                "The test runner failed to initialize for UI testing",
            )
            .with(RemediationTier::RetryOnly, "Segmentation fault")
            .with(RemediationTier::RetryOnly, "error: stat")
    }

    pub fn legacy() -> Self {
        Self::new()
            .with(RemediationTier::RetryOnly, "The Xcode build system has crashed")
            .with(
                RemediationTier::RetryOnly,
                "Command CodeSign failed with a nonzero exit code",
            )
    }

    /// Append a signature. Order within a tier is match order.
    pub fn with(mut self, tier: RemediationTier, pattern: impl Into<String>) -> Self {
        self.signatures.push(ErrorSignature::new(pattern, tier));
        self
    }

    /// Signatures belonging to `tier`, in insertion order.
    pub fn tier(&self, tier: RemediationTier) -> impl Iterator<Item = &ErrorSignature> {
        self.signatures.iter().filter(move |s| s.tier == tier)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}
