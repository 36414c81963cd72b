//! Property tests for simulation and risk invariants.
//!
//! Uses proptest to verify:
//! 1. Equity accounting: final equity == initial + sum(pnl) on random walks
//! 2. Single position: trades never overlap
//! 3. Sizing: risk at the stop never exceeds the budget, exposure never exceeds the cap
//! 4. Parsing: arbitrary model text always yields a decision with confidence in [0, 1]
//! 5. ATR quantile stays in (0, 1]

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use tradegate_core::ai::{parse_response_text, HeuristicProvider};
use tradegate_core::domain::{Bar, ExperimentMode};
use tradegate_core::engine::run_simulation;
use tradegate_core::indicators::{atr_quantile, TrendPullbackIndicators};
use tradegate_core::risk::{build_stop_loss, compute_position_size, max_qty_by_exposure, RiskEngine};
use tradegate_core::strategy::TrendPullback;
use tradegate_core::{RiskConfig, SimulationConfig, StrategyConfig};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_returns(n: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.03..0.035_f64, n)
}

fn arb_price() -> impl Strategy<Value = f64> {
    (10.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn walk_bars(returns: &[f64], step: Duration) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
    let mut close = 100.0;
    returns
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let open = close;
            close = (close * (1.0 + r)).max(1.0);
            let open_time = base + step * i as i32;
            Bar {
                open_time,
                close_time: open_time + step,
                open,
                high: open.max(close) * 1.004,
                low: open.min(close) * 0.996,
                close,
                volume: 1_000.0,
            }
        })
        .collect()
}

fn daily(fast: &[Bar]) -> Vec<Bar> {
    fast.chunks_exact(6)
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

// ── 1-2. Simulation invariants ───────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn accounting_and_single_position_hold(returns in arb_returns(700)) {
        let fast = walk_bars(&returns, Duration::hours(4));
        let slow = daily(&fast);
        let config = SimulationConfig {
            warmup_bars: 100,
            min_slow_bars: 20,
            ..SimulationConfig::default()
        };
        let risk = RiskEngine::new(RiskConfig::default());
        let indicators = TrendPullbackIndicators::default();
        let candidates = TrendPullback::new(StrategyConfig {
            pullback_atr_threshold: 1.5,
            atr_high_quantile: 0.95,
        });

        for mode in ExperimentMode::ALL {
            let out = run_simulation(
                mode, &fast, &slow, &config, &risk, &indicators, &candidates, &HeuristicProvider,
            ).unwrap();

            let booked: f64 = out.trades.iter().map(|t| t.pnl).sum();
            prop_assert!((out.final_equity - (config.initial_equity + booked)).abs() < 1e-6);

            for pair in out.trades.windows(2) {
                prop_assert!(pair[0].closed_at < pair[1].opened_at);
            }
            for trade in &out.trades {
                prop_assert!(trade.qty > 0.0);
                prop_assert!(trade.closed_at >= trade.opened_at);
            }
        }
    }
}

// ── 3. Sizing bounds ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn risk_at_stop_within_budget(
        equity in 1_000.0..1_000_000.0_f64,
        entry in arb_price(),
        atr_frac in 0.001..0.2_f64,
        mult in 1.0..5.0_f64,
        budget in 0.1..2.0_f64,
    ) {
        let stop = build_stop_loss(entry, entry * atr_frac, mult);
        let qty = compute_position_size(equity, entry, stop, budget);
        prop_assert!(qty >= 0.0);
        if stop > 0.0 {
            prop_assert!(qty * (entry - stop) <= equity * budget / 100.0 + 1e-6);
        } else {
            prop_assert_eq!(qty, 0.0);
        }
    }

    #[test]
    fn exposure_cap_bounds_notional(
        equity in 1_000.0..1_000_000.0_f64,
        entry in arb_price(),
        pct in 1.0..50.0_f64,
    ) {
        let cap = max_qty_by_exposure(equity, entry, pct);
        prop_assert!(cap * entry <= equity * pct / 100.0 + 1e-6);
    }
}

// ── 4. Parsing never escapes [0, 1] ──────────────────────────────────

proptest! {
    #[test]
    fn arbitrary_text_parses_to_bounded_decision(text in ".{0,200}") {
        let d = parse_response_text(&text);
        prop_assert!((0.0..=1.0).contains(&d.confidence));
    }

    #[test]
    fn out_of_range_confidence_is_denied(conf in prop_oneof![-10.0..-0.001_f64, 1.001..10.0_f64]) {
        let text = format!(r#"{{"decision":"ALLOW","confidence":{conf}}}"#);
        let d = parse_response_text(&text);
        prop_assert!(d.is_deny());
        prop_assert_eq!(d.confidence, 0.0);
    }
}

// ── 5. ATR quantile range ────────────────────────────────────────────

proptest! {
    #[test]
    fn atr_quantile_in_unit_interval(
        values in prop::collection::vec(0.01..50.0_f64, 1..400),
        lookback in 1usize..300,
    ) {
        let q = atr_quantile(&values, lookback);
        prop_assert!(q > 0.0 && q <= 1.0);
    }
}
