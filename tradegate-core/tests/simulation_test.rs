//! Integration tests for the per-mode simulation.
//!
//! Tests:
//! 1. AI gate: always-DENY blocks every entry but still logs decisions
//! 2. Degraded path: transport failure falls back to ALLOW 0.5 and still trades
//! 3. Accounting: final equity == initial + sum(trade pnl)
//! 4. Single position: trades never overlap in time
//! 5. Guards: the loss streak blocks entries with a risk-guard warning
//! 6. Guards: the weekly drawdown blocks entries until the ISO week rolls over
//! 7. Sizing: ai_filter_sizing scales qty by the AI confidence

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use tradegate_core::ai::{FixedProvider, HeuristicProvider, TransportError};
use tradegate_core::domain::{
    AiDecision, Bar, CloseReason, Decision, ExperimentMode, IndicatorSnapshot, Trend,
};
use tradegate_core::engine::{run_simulation, RunWarning, SimulationOutput};
use tradegate_core::indicators::{IndicatorError, IndicatorModel, TrendPullbackIndicators};
use tradegate_core::risk::{GuardReason, RiskEngine};
use tradegate_core::strategy::TrendPullback;
use tradegate_core::{RiskConfig, SimulationConfig, StrategyConfig};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Bars at a fixed step from a close path; high/low wrap open and close by `spread`.
fn bars_from(closes: &[f64], step: Duration, spread: f64) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let open_time = base_time() + step * i as i32;
            Bar {
                open_time,
                close_time: open_time + step,
                open,
                high: open.max(close) + spread,
                low: open.min(close) - spread,
                close,
                volume: 1_000.0,
            }
        })
        .collect()
}

/// Uptrend with a 4h oscillation so price keeps revisiting the fast EMA.
fn trending_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + 0.08 * i as f64 + 2.0 * (i as f64 * 0.35).sin())
        .collect()
}

fn daily_from_fast(fast: &[Bar]) -> Vec<Bar> {
    fast.chunks(6)
        .filter(|c| c.len() == 6)
        .map(|c| Bar {
            open_time: c[0].open_time,
            close_time: c[5].close_time,
            open: c[0].open,
            high: c.iter().map(|b| b.high).fold(f64::MIN, f64::max),
            low: c.iter().map(|b| b.low).fold(f64::MAX, f64::min),
            close: c[5].close,
            volume: c.iter().map(|b| b.volume).sum(),
        })
        .collect()
}

/// Always-UP snapshot sitting on the fast EMA, so every flat bar is a candidate.
struct AlwaysPullback;

impl IndicatorModel for AlwaysPullback {
    fn compute(&self, fast: &[Bar], _slow: &[Bar]) -> Result<IndicatorSnapshot, IndicatorError> {
        let price = fast.last().ok_or(IndicatorError::EmptyInput)?.close;
        Ok(IndicatorSnapshot {
            price,
            ema20_fast: price,
            ema50_fast: price,
            ema20_slow: price,
            ema50_slow: price,
            atr: 2.0,
            atr_quantile: 0.5,
            distance_to_ema20_atr: 0.0,
            trend: Trend::Up,
        })
    }
}

fn sim_config(warmup: usize) -> SimulationConfig {
    SimulationConfig {
        warmup_bars: warmup,
        min_slow_bars: 1,
        ..SimulationConfig::default()
    }
}

fn assert_accounting(out: &SimulationOutput) {
    let booked: f64 = out.trades.iter().map(|t| t.pnl).sum();
    assert!(
        (out.final_equity - (out.initial_equity + booked)).abs() < 1e-6,
        "final {} != initial {} + pnl {}",
        out.final_equity,
        out.initial_equity,
        booked
    );
}

fn assert_no_overlap(out: &SimulationOutput) {
    for pair in out.trades.windows(2) {
        assert!(
            pair[0].closed_at < pair[1].opened_at,
            "trade opened at {} before previous closed at {}",
            pair[1].opened_at,
            pair[0].closed_at
        );
    }
}

#[test]
fn always_deny_blocks_entries_but_logs_decisions() {
    let fast = bars_from(&[100.0; 60], Duration::hours(4), 1.0);
    let slow = daily_from_fast(&fast);
    let risk = RiskEngine::new(RiskConfig::default());
    let provider = FixedProvider::decision(AiDecision::new(
        Decision::Deny,
        0.95,
        ["EVENT"],
        ["macro_event_window"],
    ));

    let out = run_simulation(
        ExperimentMode::AiFilter,
        &fast,
        &slow,
        &sim_config(10),
        &risk,
        &AlwaysPullback,
        &TrendPullback::default(),
        &provider,
    )
    .unwrap();

    assert!(out.trades.is_empty());
    assert!(!out.decisions.is_empty());
    assert!(out.decisions.iter().all(|d| d.decision == Decision::Deny));
    assert_eq!(provider.calls(), out.decisions.len());
    assert_eq!(out.final_equity, out.initial_equity);
}

#[test]
fn transport_failure_still_trades_degraded() {
    let fast = bars_from(&[100.0; 60], Duration::hours(4), 1.0);
    let slow = daily_from_fast(&fast);
    let risk = RiskEngine::new(RiskConfig::default());
    let provider = FixedProvider::failing(TransportError::Request("timeout".into()));

    let out = run_simulation(
        ExperimentMode::AiFilter,
        &fast,
        &slow,
        &sim_config(10),
        &risk,
        &AlwaysPullback,
        &TrendPullback::default(),
        &provider,
    )
    .unwrap();

    assert!(!out.trades.is_empty());
    assert!(out.decisions.iter().all(|d| d.degraded && d.confidence == 0.5));
    assert!(out.trades.iter().all(|t| t.ai_decision == Decision::Allow));
    assert_accounting(&out);
}

#[test]
fn real_indicators_keep_accounting_and_single_position() {
    let fast = bars_from(&trending_closes(1_500), Duration::hours(4), 0.8);
    let slow = daily_from_fast(&fast);
    let risk = RiskEngine::new(RiskConfig::default());
    let indicators = TrendPullbackIndicators::default();
    let candidates = TrendPullback::new(StrategyConfig::default());

    for mode in ExperimentMode::ALL {
        let out = run_simulation(
            mode,
            &fast,
            &slow,
            &SimulationConfig::default(),
            &risk,
            &indicators,
            &candidates,
            &HeuristicProvider,
        )
        .unwrap();
        assert_accounting(&out);
        assert_no_overlap(&out);
        for trade in &out.trades {
            assert!(trade.qty > 0.0);
            assert!(trade.stop_loss < trade.entry_price);
            assert!((trade.pnl - (trade.exit_price - trade.entry_price) * trade.qty).abs() < 1e-9);
        }
        if let Some(last) = out.equity_curve.last() {
            if out.trades.last().map(|t| t.close_reason) == Some(CloseReason::EndOfData) {
                assert!((last.equity - out.final_equity).abs() < 1e-9);
            }
        }
    }
}

#[test]
fn loss_streak_blocks_entries() {
    // Each bar collapses far below any ATR stop, so every trade loses.
    let mut closes = Vec::new();
    for i in 0..80 {
        closes.push(if i % 2 == 0 { 100.0 } else { 80.0 });
    }
    let fast = bars_from(&closes, Duration::hours(4), 1.0);
    let slow = daily_from_fast(&fast);
    let risk = RiskEngine::new(RiskConfig {
        max_consecutive_losses: 2,
        max_weekly_drawdown_pct: 10.0,
        ..RiskConfig::default()
    });

    let out = run_simulation(
        ExperimentMode::Baseline,
        &fast,
        &slow,
        &sim_config(10),
        &risk,
        &AlwaysPullback,
        &TrendPullback::default(),
        &HeuristicProvider,
    )
    .unwrap();

    assert_eq!(out.trades.len(), 2);
    assert!(out.trades.iter().all(|t| t.close_reason == CloseReason::StopLoss));
    assert!(out
        .warnings
        .iter()
        .any(|w| matches!(w, RunWarning::RiskGuardBlock { .. })));
    assert_accounting(&out);
}

#[test]
fn weekly_drawdown_blocks_until_next_iso_week() {
    // 2024-01-01 is a Monday; 16 days of 4h bars span ISO weeks 1, 2 and 3.
    let closes: Vec<f64> = (0..96).map(|i| if i % 2 == 0 { 100.0 } else { 80.0 }).collect();
    let fast = bars_from(&closes, Duration::hours(4), 1.0);
    let slow = daily_from_fast(&fast);
    let risk = RiskEngine::new(RiskConfig {
        max_consecutive_losses: 10,
        max_weekly_drawdown_pct: 1.0,
        ..RiskConfig::default()
    });

    let out = run_simulation(
        ExperimentMode::Baseline,
        &fast,
        &slow,
        &sim_config(10),
        &risk,
        &AlwaysPullback,
        &TrendPullback::default(),
        &HeuristicProvider,
    )
    .unwrap();

    let first_block = out
        .warnings
        .iter()
        .find_map(|w| match w {
            RunWarning::RiskGuardBlock { at, reasons } => Some((*at, reasons.clone())),
            _ => None,
        })
        .expect("weekly drawdown should block an entry");
    assert_eq!(first_block.0.iso_week().week(), 1);
    assert!(first_block.1.contains(&GuardReason::MaxWeeklyDrawdownReached));
    assert!(!first_block.1.contains(&GuardReason::MaxConsecutiveLossesReached));
    assert!(out.warnings.iter().any(|w| w.to_string() == "risk_guard_block:max_weekly_drawdown_reached"));

    // Nothing opens in week 1 once blocked; the week-2 watermark lets trading resume.
    assert!(out
        .trades
        .iter()
        .filter(|t| t.opened_at.iso_week().week() == 1)
        .all(|t| t.opened_at < first_block.0));
    let week_two = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
    assert!(out.trades.iter().any(|t| t.opened_at >= week_two));
    assert!(out.trades.iter().all(|t| t.close_reason == CloseReason::StopLoss));
    assert_accounting(&out);
    assert_no_overlap(&out);
}

#[test]
fn sizing_mode_scales_qty_by_confidence() {
    let fast = bars_from(&[100.0; 60], Duration::hours(4), 1.0);
    let slow = daily_from_fast(&fast);
    // Wide exposure cap so only the risk budget sets the size.
    let risk = RiskEngine::new(RiskConfig {
        max_total_exposure_pct: 50.0,
        ..RiskConfig::default()
    });
    let provider = FixedProvider::decision(AiDecision::new(
        Decision::Allow,
        0.2,
        Vec::<String>::new(),
        ["weak_setup"],
    ));

    let first_qty = |mode| {
        let out = run_simulation(
            mode,
            &fast,
            &slow,
            &sim_config(10),
            &risk,
            &AlwaysPullback,
            &TrendPullback::default(),
            &provider,
        )
        .unwrap();
        assert_accounting(&out);
        out.trades.first().map(|t| t.qty).expect("an entry should fill")
    };

    let filtered = first_qty(ExperimentMode::AiFilter);
    let sized = first_qty(ExperimentMode::AiFilterSizing);
    // 10_000 * 0.5% / (2 ATR * 2.0) = 12.5 at full budget.
    assert!((filtered - 12.5).abs() < 1e-9, "filter qty {filtered}");
    assert!((sized - 0.2 * filtered).abs() < 1e-9, "sizing qty {sized}");
}
