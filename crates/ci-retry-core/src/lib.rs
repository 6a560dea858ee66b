//! ci-retry core - build log triage for Xcode CI
//!
//! Provides the pure pieces of the retry workflow:
//! - A data-driven table of known error signatures, grouped by remediation tier
//! - A classifier that turns scanned log artifacts into a single [`Decision`]
//! - A [`RetryEngine`] that applies a decision through an injected [`Remediator`]
//! - Test failure extraction and GitHub Actions annotation formatting

pub mod classifier;
pub mod env_file;
pub mod error;
pub mod failures;
pub mod fakes;
pub mod remediation;
pub mod report;
pub mod signature;
pub mod telemetry;

pub use classifier::{classify, Decision, LogArtifact};
pub use env_file::{EnvFile, RETRY_FLAG_LINE};
pub use error::{Result, RetryError};
pub use failures::{
    build_device_map, collect_failures, extract_failures, truncate_message, DeviceInfo,
    FailureRecord, NodeKind, TestNode, TestResults, MAX_MESSAGE_LENGTH,
};
pub use remediation::{announcement, DryRunRemediator, EngineOutcome, Remediator, RetryEngine};
pub use report::{escape_annotation, format_annotation, format_summary};
pub use signature::{ErrorSignature, RemediationTier, SignatureProfile, SignatureTable};
pub use telemetry::init_tracing;
