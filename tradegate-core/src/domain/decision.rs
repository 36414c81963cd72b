//! AI gate decisions and the per-bar decision log entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::mode::ExperimentMode;

/// Risk flag attached when the provider could not be reached.
pub const FLAG_AI_UNAVAILABLE: &str = "AI_UNAVAILABLE";
/// Risk flag attached when the model response failed strict validation.
pub const FLAG_INVALID_RESPONSE: &str = "INVALID_RESPONSE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Allow,
    Deny,
    Reduce,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::Deny => "DENY",
            Decision::Reduce => "REDUCE",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated gate decision.
///
/// Construct through [`AiDecision::new`] or the parsing helpers in
/// [`crate::ai::parse`]; both keep `confidence` inside [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiDecision {
    pub decision: Decision,
    pub confidence: f64,
    pub risk_flags: BTreeSet<String>,
    pub key_reasons: Vec<String>,
}

impl AiDecision {
    pub fn new<F, R>(decision: Decision, confidence: f64, risk_flags: F, key_reasons: R) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            decision,
            confidence: clamp_unit(confidence),
            risk_flags: risk_flags.into_iter().map(Into::into).collect(),
            key_reasons: key_reasons.into_iter().map(Into::into).collect(),
        }
    }

    /// Decision recorded by the baseline mode, which never consults a provider.
    pub fn baseline() -> Self {
        Self::new(Decision::Allow, 1.0, Vec::<String>::new(), ["baseline_no_ai"])
    }

    /// Degraded decision used when the provider transport fails.
    pub fn degraded(error: impl fmt::Display) -> Self {
        Self::new(
            Decision::Allow,
            0.5,
            [FLAG_AI_UNAVAILABLE],
            [format!("fallback_to_rules:{error}")],
        )
    }

    /// Conservative decision for any response that fails validation.
    pub fn deny_default(reason: impl Into<String>) -> Self {
        Self::new(Decision::Deny, 0.0, [FLAG_INVALID_RESPONSE], [reason.into()])
    }

    pub fn is_deny(&self) -> bool {
        self.decision == Decision::Deny
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.risk_flags.contains(flag)
    }

    /// Confidence clamped to [0, 1].
    pub fn clamped_confidence(&self) -> f64 {
        clamp_unit(self.confidence)
    }

    /// A call counts as successful unless it produced the invalid-response DENY.
    pub fn counts_as_call_success(&self) -> bool {
        !(self.is_deny() && self.has_flag(FLAG_INVALID_RESPONSE))
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// One decision-log line: emitted whenever a candidate reaches the gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub timestamp: DateTime<Utc>,
    pub mode: ExperimentMode,
    pub decision: Decision,
    pub confidence: f64,
    pub risk_flags: BTreeSet<String>,
    pub key_reasons: Vec<String>,
    pub degraded: bool,
}

impl DecisionRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        mode: ExperimentMode,
        decision: &AiDecision,
        degraded: bool,
    ) -> Self {
        Self {
            timestamp,
            mode,
            decision: decision.decision,
            confidence: decision.confidence,
            risk_flags: decision.risk_flags.clone(),
            key_reasons: decision.key_reasons.clone(),
            degraded,
        }
    }
}
