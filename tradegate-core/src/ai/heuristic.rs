use crate::domain::{AiDecision, AtrLabel, Decision, EventRisk, MarketSnapshot};

use super::{DecisionProvider, TransportError};

/// Funding above this is treated as crowded longs.
pub const FUNDING_CROWDING_THRESHOLD: f64 = 0.01;

/// Deterministic offline provider for reproducible backtests.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicProvider;

impl HeuristicProvider {
    pub fn decide(snapshot: &MarketSnapshot) -> AiDecision {
        if snapshot.event_risk == EventRisk::Yes {
            return AiDecision::new(Decision::Deny, 0.0, ["EVENT"], ["macro_event_window"]);
        }
        if snapshot.atr_label == AtrLabel::High {
            return AiDecision::new(Decision::Reduce, 0.5, ["VOLATILE"], ["atr_high"]);
        }
        let crowded = snapshot.funding_available
            && snapshot
                .funding_rate
                .is_some_and(|rate| rate > FUNDING_CROWDING_THRESHOLD);
        if crowded {
            return AiDecision::new(
                Decision::Reduce,
                0.6,
                ["CROWDING"],
                ["funding_extreme_positive"],
            );
        }
        AiDecision::new(
            Decision::Allow,
            0.85,
            Vec::<String>::new(),
            ["regime_supportive"],
        )
    }
}

impl DecisionProvider for HeuristicProvider {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn evaluate(&self, snapshot: &MarketSnapshot) -> Result<AiDecision, TransportError> {
        Ok(Self::decide(snapshot))
    }
}
