//! Log classification into a single retry decision.
//!
//! Tiers are evaluated in priority order across the whole artifact set, so a
//! derived-data signature in the last artifact still beats a retry-only
//! signature in the first one. Within a tier the first artifact (in input
//! order) and the first signature (in table order) win.

use serde::{Deserialize, Serialize};

use crate::signature::{ErrorSignature, RemediationTier, SignatureTable};

/// One unit of scanned build or test output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogArtifact {
    /// Raw contents of a plain build log.
    Text { source: String, text: String },

    /// Error summaries extracted from a structured result bundle.
    Messages {
        source: String,
        messages: Vec<String>,
    },
}

impl LogArtifact {
    pub fn text(source: impl Into<String>, text: impl Into<String>) -> Self {
        LogArtifact::Text {
            source: source.into(),
            text: text.into(),
        }
    }

    pub fn messages(source: impl Into<String>, messages: Vec<String>) -> Self {
        LogArtifact::Messages {
            source: source.into(),
            messages,
        }
    }

    /// Where this artifact came from (file name or bundle path).
    pub fn source(&self) -> &str {
        match self {
            LogArtifact::Text { source, .. } | LogArtifact::Messages { source, .. } => source,
        }
    }

    /// Whether `signature` occurs in the text or in any extracted message.
    pub fn contains(&self, signature: &ErrorSignature) -> bool {
        match self {
            LogArtifact::Text { text, .. } => signature.matches(text),
            LogArtifact::Messages { messages, .. } => {
                messages.iter().any(|m| signature.matches(m))
            }
        }
    }
}

/// Outcome of classifying an artifact set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    /// No known signature was found.
    NoAction,

    /// A known signature was found; remediate at `tier` and retry.
    Remediate {
        tier: RemediationTier,
        signature: String,
        source: String,
    },
}

impl Decision {
    pub fn tier(&self) -> Option<RemediationTier> {
        match self {
            Decision::NoAction => None,
            Decision::Remediate { tier, .. } => Some(*tier),
        }
    }

    pub fn requires_retry(&self) -> bool {
        matches!(self, Decision::Remediate { .. })
    }
}

/// Classify `artifacts` against `table`.
///
/// Deterministic: the same table and artifact sequence always yield the same
/// decision. Matching stops at the first hit.
pub fn classify(table: &SignatureTable, artifacts: &[LogArtifact]) -> Decision {
    for tier in RemediationTier::PRIORITY {
        for artifact in artifacts {
            if let Some(signature) = table.tier(tier).find(|sig| artifact.contains(sig)) {
                return Decision::Remediate {
                    tier,
                    signature: signature.pattern.clone(),
                    source: artifact.source().to_string(),
                };
            }
        }
    }
    Decision::NoAction
}
