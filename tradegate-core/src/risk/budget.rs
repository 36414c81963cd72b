use serde::{Deserialize, Serialize};

use crate::domain::{AiDecision, Decision, ExperimentMode};

/// How the per-trade risk budget reacts to the AI decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBudgetPolicy {
    /// `ai_filter_sizing` scales the base budget by confidence; other modes use the base.
    #[default]
    ModeScaled,
    /// Live-cycle sizing: degraded halves the budget, REDUCE scales by confidence,
    /// anything else scales by confidence floored at 0.5.
    CycleGated,
}

impl RiskBudgetPolicy {
    pub fn effective_budget(
        self,
        base: f64,
        mode: ExperimentMode,
        decision: &AiDecision,
        degraded: bool,
    ) -> f64 {
        match self {
            RiskBudgetPolicy::ModeScaled => {
                if mode.scales_by_confidence() {
                    base * decision.clamped_confidence()
                } else {
                    base
                }
            }
            RiskBudgetPolicy::CycleGated => {
                if degraded {
                    base * 0.5
                } else if decision.decision == Decision::Reduce {
                    base * decision.clamped_confidence()
                } else {
                    base * decision.confidence.clamp(0.5, 1.0)
                }
            }
        }
    }
}
