//! Per-mode results and the suite report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use tradegate_core::domain::{
    DecisionRecord, EquityPoint, ExperimentMode, SegmentSpec, TradeRecord,
};
use tradegate_core::engine::{RunWarning, SimulationOutput};

use crate::gate::GoNoGo;
use crate::metrics::{compute_segment_metrics, SummaryMetrics};

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything one experiment mode produced, plus its metrics.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentResult {
    pub mode: ExperimentMode,
    pub initial_equity: f64,
    pub final_equity: f64,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    pub decisions: Vec<DecisionRecord>,
    pub warnings: Vec<RunWarning>,
    pub metrics: SummaryMetrics,
    /// Filled in by the suite once segments are known.
    pub segment_metrics: BTreeMap<String, SummaryMetrics>,
}

impl ExperimentResult {
    pub fn empty(mode: ExperimentMode, initial_equity: f64) -> Self {
        Self::from_output(SimulationOutput::new(mode, initial_equity))
    }

    pub fn from_output(output: SimulationOutput) -> Self {
        let metrics = SummaryMetrics::compute(&output.equity_curve, &output.trades);
        Self {
            mode: output.mode,
            initial_equity: output.initial_equity,
            final_equity: output.final_equity,
            trades: output.trades,
            equity_curve: output.equity_curve,
            decisions: output.decisions,
            warnings: output.warnings,
            metrics,
            segment_metrics: BTreeMap::new(),
        }
    }

    pub fn attach_segments(&mut self, segments: &[SegmentSpec]) {
        self.segment_metrics = compute_segment_metrics(&self.equity_curve, &self.trades, segments);
    }

    /// Decisions the provider could not deliver and were replaced by the fallback.
    pub fn degraded_decisions(&self) -> usize {
        self.decisions.iter().filter(|d| d.degraded).count()
    }
}

/// The whole suite: every mode over the same data plus the verdict.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub schema_version: u32,
    pub symbol: String,
    pub started_at: DateTime<Utc>,
    pub source: String,
    pub dataset_hash: String,
    pub segments: Vec<SegmentSpec>,
    pub experiments: BTreeMap<ExperimentMode, ExperimentResult>,
    pub go_no_go: GoNoGo,
}

impl BacktestReport {
    pub fn experiment(&self, mode: ExperimentMode) -> Option<&ExperimentResult> {
        self.experiments.get(&mode)
    }
}
