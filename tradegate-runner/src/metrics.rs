//! Performance metrics: pure functions over an equity curve and trade list.
//!
//! Every metric is a pure function: equity points and/or trades in, value out.
//! No dependencies on the runner, data loading, or the simulation loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use tradegate_core::domain::{EquityPoint, SegmentSpec, TradeRecord};

const SECONDS_PER_DAY: f64 = 86_400.0;
/// Floor on the measured span so a single-timestamp curve does not divide by zero.
const MIN_DURATION_DAYS: f64 = 1e-9;

pub const DEFAULT_SEGMENT_A: &str = "window_a";
pub const DEFAULT_SEGMENT_B: &str = "window_b";

/// Summary statistics for one mode run (or one segment of it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub trade_count: usize,
    pub total_return_pct: f64,
    pub max_drawdown_pct: f64,
    /// Bars from the worst trough back to its peak; `None` if never recovered.
    pub max_drawdown_recovery_bars: Option<usize>,
    pub expectancy_per_trade: f64,
    pub trade_frequency_per_30d: f64,
    pub win_rate_pct: f64,
}

impl Default for SummaryMetrics {
    fn default() -> Self {
        Self {
            trade_count: 0,
            total_return_pct: 0.0,
            max_drawdown_pct: 0.0,
            max_drawdown_recovery_bars: None,
            expectancy_per_trade: 0.0,
            trade_frequency_per_30d: 0.0,
            win_rate_pct: 0.0,
        }
    }
}

impl SummaryMetrics {
    /// Compute all metrics from an equity curve and trade list.
    ///
    /// An empty curve yields the all-zero defaults regardless of trades.
    pub fn compute(equity_curve: &[EquityPoint], trades: &[TradeRecord]) -> Self {
        let (first, last) = match (equity_curve.first(), equity_curve.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Self::default(),
        };
        let values: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let (max_drawdown_pct, recovery) = max_drawdown_with_recovery(&values);
        Self {
            trade_count: trades.len(),
            total_return_pct: total_return_pct(&values),
            max_drawdown_pct,
            max_drawdown_recovery_bars: recovery,
            expectancy_per_trade: expectancy(trades),
            trade_frequency_per_30d: trade_frequency_per_30d(
                trades.len(),
                first.timestamp,
                last.timestamp,
            ),
            win_rate_pct: win_rate_pct(trades),
        }
    }
}

/// Convenience wrapper matching the other metric functions.
pub fn compute_summary_metrics(equity_curve: &[EquityPoint], trades: &[TradeRecord]) -> SummaryMetrics {
    SummaryMetrics::compute(equity_curve, trades)
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return in percent: (last / first - 1) * 100. 0.0 if first <= 0.
pub fn total_return_pct(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => (last / first - 1.0) * 100.0,
        _ => 0.0,
    }
}

/// Maximum peak-to-trough drawdown in percent, with recovery length.
///
/// Recovery is the number of points after the trough until equity is back at
/// the peak that produced the maximum drawdown. `Some(0)` when there was no
/// drawdown, `None` when the curve never recovers.
pub fn max_drawdown_with_recovery(values: &[f64]) -> (f64, Option<usize>) {
    let Some(&first) = values.first() else {
        return (0.0, None);
    };
    let mut peak = first;
    let mut peak_idx = 0;
    let mut max_dd = 0.0_f64;
    let mut trough_idx = 0;
    let mut peak_idx_for_max = 0;

    for (idx, &value) in values.iter().enumerate() {
        if value > peak {
            peak = value;
            peak_idx = idx;
        }
        let dd = if peak <= 0.0 {
            0.0
        } else {
            (peak - value) / peak * 100.0
        };
        if dd > max_dd {
            max_dd = dd;
            trough_idx = idx;
            peak_idx_for_max = peak_idx;
        }
    }

    if max_dd <= 0.0 {
        return (0.0, Some(0));
    }

    let target = values[peak_idx_for_max];
    let recovery = values[trough_idx + 1..]
        .iter()
        .position(|&v| v >= target)
        .map(|offset| offset + 1);
    (max_dd, recovery)
}

/// Mean trade P&L. 0.0 with no trades.
pub fn expectancy(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.pnl).sum::<f64>() / trades.len() as f64
}

/// Winning trades as a percentage. 0.0 with no trades.
pub fn win_rate_pct(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let wins = trades.iter().filter(|t| t.is_winner()).count();
    wins as f64 / trades.len() as f64 * 100.0
}

/// Trades per 30 days over the span between two timestamps.
pub fn trade_frequency_per_30d(trade_count: usize, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let days = ((end - start).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY)
        .max(MIN_DURATION_DAYS);
    trade_count as f64 / days * 30.0
}

// ─── Segments ───────────────────────────────────────────────────────

/// Metrics per named segment. Points and trades (by close time) on a boundary are included.
pub fn compute_segment_metrics(
    equity_curve: &[EquityPoint],
    trades: &[TradeRecord],
    segments: &[SegmentSpec],
) -> BTreeMap<String, SummaryMetrics> {
    segments
        .iter()
        .map(|segment| {
            let points: Vec<EquityPoint> = equity_curve
                .iter()
                .filter(|p| segment.contains(p.timestamp))
                .cloned()
                .collect();
            let closed: Vec<TradeRecord> = trades
                .iter()
                .filter(|t| segment.contains(t.closed_at))
                .cloned()
                .collect();
            (segment.name.clone(), SummaryMetrics::compute(&points, &closed))
        })
        .collect()
}

/// Split a curve into two halves: `window_a` = [0, mid-1], `window_b` = [mid, last].
///
/// Fewer than two points gives no segments.
pub fn build_default_segments(equity_curve: &[EquityPoint]) -> Vec<SegmentSpec> {
    if equity_curve.len() < 2 {
        return Vec::new();
    }
    let mid = equity_curve.len() / 2;
    let last = equity_curve.len() - 1;
    vec![
        SegmentSpec {
            name: DEFAULT_SEGMENT_A.to_string(),
            start: equity_curve[0].timestamp,
            end: equity_curve[mid - 1].timestamp,
        },
        SegmentSpec {
            name: DEFAULT_SEGMENT_B.to_string(),
            start: equity_curve[mid].timestamp,
            end: equity_curve[last].timestamp,
        },
    ]
}
