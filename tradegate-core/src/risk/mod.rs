//! Hard risk rules: global guards, ATR stops, risk-budget sizing, time stops.
//!
//! The rules are pure functions; [`RiskEngine`] binds them to a [`RiskConfig`].

pub mod budget;

pub use budget::RiskBudgetPolicy;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::RiskConfig;
use crate::domain::{AiDecision, ExperimentMode};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Account stats fed to the global guards.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AccountStats {
    pub consecutive_losses: u32,
    pub weekly_drawdown_pct: f64,
    pub total_exposure_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardReason {
    MaxConsecutiveLossesReached,
    MaxWeeklyDrawdownReached,
    MaxTotalExposureExceeded,
}

impl GuardReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardReason::MaxConsecutiveLossesReached => "max_consecutive_losses_reached",
            GuardReason::MaxWeeklyDrawdownReached => "max_weekly_drawdown_reached",
            GuardReason::MaxTotalExposureExceeded => "max_total_exposure_exceeded",
        }
    }
}

impl fmt::Display for GuardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuardCheck {
    pub allowed: bool,
    pub reasons: Vec<GuardReason>,
}

/// Long stop `entry - atr * multiplier`, floored at 0. Any non-positive input gives 0.
pub fn build_stop_loss(entry: f64, atr: f64, atr_multiplier: f64) -> f64 {
    if entry <= 0.0 || atr <= 0.0 || atr_multiplier <= 0.0 {
        return 0.0;
    }
    (entry - atr * atr_multiplier).max(0.0)
}

/// Quantity risking `risk_budget_pct` of equity between entry and stop.
pub fn compute_position_size(equity: f64, entry: f64, stop: f64, risk_budget_pct: f64) -> f64 {
    if equity <= 0.0 || entry <= 0.0 || stop <= 0.0 {
        return 0.0;
    }
    let per_unit_risk = entry - stop;
    if per_unit_risk <= 0.0 {
        return 0.0;
    }
    let risk_amount = equity * (risk_budget_pct / 100.0);
    (risk_amount / per_unit_risk).max(0.0)
}

/// True once the position has been held at least `max_holding_days`.
pub fn check_time_stop(opened_at: DateTime<Utc>, now: DateTime<Utc>, max_holding_days: u32) -> bool {
    let held_days = (now - opened_at).num_seconds() as f64 / SECONDS_PER_DAY;
    held_days >= f64::from(max_holding_days)
}

/// Largest quantity whose notional stays within `max_exposure_pct` of equity.
pub fn max_qty_by_exposure(equity: f64, entry: f64, max_exposure_pct: f64) -> f64 {
    if equity <= 0.0 || entry <= 0.0 || max_exposure_pct <= 0.0 {
        return 0.0;
    }
    equity * max_exposure_pct / 100.0 / entry
}

/// Risk rules bound to one configuration.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn check_global_guards(&self, stats: &AccountStats) -> GuardCheck {
        let mut reasons = Vec::new();
        if stats.consecutive_losses >= self.config.max_consecutive_losses {
            reasons.push(GuardReason::MaxConsecutiveLossesReached);
        }
        if stats.weekly_drawdown_pct >= self.config.max_weekly_drawdown_pct {
            reasons.push(GuardReason::MaxWeeklyDrawdownReached);
        }
        if stats.total_exposure_pct > self.config.max_total_exposure_pct {
            reasons.push(GuardReason::MaxTotalExposureExceeded);
        }
        GuardCheck {
            allowed: reasons.is_empty(),
            reasons,
        }
    }

    pub fn stop_loss(&self, entry: f64, atr: f64) -> f64 {
        build_stop_loss(entry, atr, self.config.stop_loss_atr_multiplier)
    }

    pub fn position_size(&self, equity: f64, entry: f64, stop: f64, risk_budget_pct: f64) -> f64 {
        compute_position_size(equity, entry, stop, risk_budget_pct)
    }

    pub fn time_stop_hit(&self, opened_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        check_time_stop(opened_at, now, self.config.max_holding_days)
    }

    pub fn exposure_cap(&self, equity: f64, entry: f64) -> f64 {
        max_qty_by_exposure(equity, entry, self.config.max_total_exposure_pct)
    }

    /// Risk budget (percent of equity) for an entry under the configured policy.
    pub fn risk_budget(&self, mode: ExperimentMode, decision: &AiDecision, degraded: bool) -> f64 {
        self.config
            .budget_policy
            .effective_budget(self.config.risk_per_trade_pct, mode, decision, degraded)
    }
}
