//! Go/No-Go gate: compare an AI-assisted mode against the baseline.
//!
//! Four checks, all of which must pass:
//! - drawdown or recovery improved
//! - trade frequency not increased
//! - expectancy not significantly worse (within 90% of a positive baseline)
//! - segment drawdowns no worse in at least half the shared segments

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use tradegate_core::domain::ExperimentMode;

use crate::metrics::SummaryMetrics;
use crate::result::ExperimentResult;

pub const MISSING_RESULTS_REASON: &str = "missing_baseline_or_ai_results";

/// Fraction of a positive baseline expectancy the candidate must keep.
const EXPECTANCY_TOLERANCE: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateChecks {
    pub drawdown_or_recovery_improved: bool,
    pub frequency_reduced: bool,
    pub expectancy_not_significantly_worse: bool,
    pub segment_consistency: bool,
}

impl GateChecks {
    pub fn all_pass(&self) -> bool {
        self.drawdown_or_recovery_improved
            && self.frequency_reduced
            && self.expectancy_not_significantly_worse
            && self.segment_consistency
    }

    /// Checks in report order, keyed by name.
    pub fn entries(&self) -> [(&'static str, bool); 4] {
        [
            ("drawdown_or_recovery_improved", self.drawdown_or_recovery_improved),
            ("frequency_reduced", self.frequency_reduced),
            (
                "expectancy_not_significantly_worse",
                self.expectancy_not_significantly_worse,
            ),
            ("segment_consistency", self.segment_consistency),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoNoGo {
    pub go: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_ai_mode: Option<ExperimentMode>,
    /// `None` when the comparison could not be made.
    pub checks: Option<GateChecks>,
}

impl GoNoGo {
    fn missing() -> Self {
        Self {
            go: false,
            reason: Some(MISSING_RESULTS_REASON.to_string()),
            selected_ai_mode: None,
            checks: None,
        }
    }
}

/// Evaluate the gate. The candidate is `ai_filter_sizing` when present, else `ai_filter`.
pub fn evaluate_go_no_go(experiments: &BTreeMap<ExperimentMode, ExperimentResult>) -> GoNoGo {
    let baseline = experiments.get(&ExperimentMode::Baseline);
    let candidate = experiments
        .get(&ExperimentMode::AiFilterSizing)
        .or_else(|| experiments.get(&ExperimentMode::AiFilter));
    let (baseline, candidate) = match (baseline, candidate) {
        (Some(b), Some(c)) => (b, c),
        _ => return GoNoGo::missing(),
    };

    let checks = compare(
        &baseline.metrics,
        &candidate.metrics,
        &baseline.segment_metrics,
        &candidate.segment_metrics,
    );
    GoNoGo {
        go: checks.all_pass(),
        reason: None,
        selected_ai_mode: Some(candidate.mode),
        checks: Some(checks),
    }
}

/// The four checks for a candidate against the baseline.
pub fn compare(
    baseline: &SummaryMetrics,
    candidate: &SummaryMetrics,
    baseline_segments: &BTreeMap<String, SummaryMetrics>,
    candidate_segments: &BTreeMap<String, SummaryMetrics>,
) -> GateChecks {
    let recovery_improved = match (
        baseline.max_drawdown_recovery_bars,
        candidate.max_drawdown_recovery_bars,
    ) {
        (Some(base), Some(cand)) => cand < base,
        _ => false,
    };
    let drawdown_or_recovery_improved =
        candidate.max_drawdown_pct < baseline.max_drawdown_pct || recovery_improved;

    let frequency_reduced = candidate.trade_frequency_per_30d <= baseline.trade_frequency_per_30d;

    let expectancy_not_significantly_worse = if baseline.expectancy_per_trade > 0.0 {
        candidate.expectancy_per_trade >= baseline.expectancy_per_trade * EXPECTANCY_TOLERANCE
    } else {
        candidate.expectancy_per_trade >= baseline.expectancy_per_trade
    };

    GateChecks {
        drawdown_or_recovery_improved,
        frequency_reduced,
        expectancy_not_significantly_worse,
        segment_consistency: segment_consistency(baseline_segments, candidate_segments),
    }
}

/// At least half (rounded down, minimum one) of the shared segments must not
/// have a worse candidate drawdown. No shared segments fails.
pub fn segment_consistency(
    baseline: &BTreeMap<String, SummaryMetrics>,
    candidate: &BTreeMap<String, SummaryMetrics>,
) -> bool {
    let shared: Vec<(&SummaryMetrics, &SummaryMetrics)> = baseline
        .iter()
        .filter_map(|(name, base)| candidate.get(name).map(|cand| (base, cand)))
        .collect();
    if shared.is_empty() {
        return false;
    }
    let improving = shared
        .iter()
        .filter(|(base, cand)| cand.max_drawdown_pct <= base.max_drawdown_pct)
        .count();
    improving >= (shared.len() / 2).max(1)
}
