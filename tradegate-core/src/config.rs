//! Engine-level parameters. Range validation lives in the runner's config loader.

use serde::{Deserialize, Serialize};

use crate::risk::RiskBudgetPolicy;

/// Hard risk limits and sizing policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskConfig {
    pub risk_per_trade_pct: f64,
    pub stop_loss_atr_multiplier: f64,
    pub max_holding_days: u32,
    pub max_consecutive_losses: u32,
    pub max_weekly_drawdown_pct: f64,
    pub max_total_exposure_pct: f64,
    pub budget_policy: RiskBudgetPolicy,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_per_trade_pct: 0.5,
            stop_loss_atr_multiplier: 2.0,
            max_holding_days: 7,
            max_consecutive_losses: 3,
            max_weekly_drawdown_pct: 3.0,
            max_total_exposure_pct: 10.0,
            budget_policy: RiskBudgetPolicy::default(),
        }
    }
}

/// Trend-pullback candidate thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyConfig {
    /// Max distance from the fast EMA20, in ATR units.
    pub pullback_atr_threshold: f64,
    /// Max ATR quantile before volatility is considered extreme.
    pub atr_high_quantile: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            pullback_atr_threshold: 0.5,
            atr_high_quantile: 0.8,
        }
    }
}

/// Per-run simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub symbol: String,
    pub initial_equity: f64,
    pub slippage_bps: f64,
    pub warmup_bars: usize,
    pub min_slow_bars: usize,
}

impl SimulationConfig {
    /// Slippage as a price fraction (2 bps -> 0.0002).
    pub fn slippage_fraction(&self) -> f64 {
        self.slippage_bps / 10_000.0
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            initial_equity: 10_000.0,
            slippage_bps: 2.0,
            warmup_bars: 200,
            min_slow_bars: 60,
        }
    }
}
