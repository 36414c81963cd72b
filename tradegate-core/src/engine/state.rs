//! Simulation account state, run warnings, and run result types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::domain::{
    CloseReason, DecisionRecord, EquityPoint, ExperimentMode, Position, TradeRecord,
};
use crate::indicators::IndicatorError;
use crate::risk::GuardReason;
use crate::time::iso_week_key;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error("warmup_bars must be positive")]
    InvalidWarmup,
    #[error("not enough fast bars: need more than {warmup}, have {available}")]
    InsufficientBars { warmup: usize, available: usize },
    #[error("{series} bars are not strictly ascending by open_time")]
    UnorderedBars { series: &'static str },
}

/// Mutable account state that evolves bar-by-bar.
///
/// The state machine is `position`: `None` is flat, `Some` is one open long.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub equity: f64,
    pub week_start_equity: f64,
    pub week_key: Option<(i32, u32)>,
    pub consecutive_losses: u32,
    pub position: Option<Position>,
}

impl SimulationState {
    pub fn new(initial_equity: f64) -> Self {
        Self {
            equity: initial_equity,
            week_start_equity: initial_equity,
            week_key: None,
            consecutive_losses: 0,
            position: None,
        }
    }

    /// Reset the weekly watermark when `now` falls in a new ISO week.
    pub fn roll_week(&mut self, now: DateTime<Utc>) {
        let key = iso_week_key(now);
        if self.week_key != Some(key) {
            self.week_key = Some(key);
            self.week_start_equity = self.equity;
        }
    }

    /// Percent drop from the week-start equity, floored at 0.
    pub fn weekly_drawdown_pct(&self) -> f64 {
        if self.week_start_equity <= 0.0 {
            return 0.0;
        }
        ((self.week_start_equity - self.equity) / self.week_start_equity * 100.0).max(0.0)
    }

    pub fn open_position(&mut self, position: Position) {
        self.position = Some(position);
    }

    /// Close the open position at `exit_price` (a fill), book the P&L and
    /// update the loss streak. `None` when flat.
    pub fn close_position(
        &mut self,
        mode: ExperimentMode,
        closed_at: DateTime<Utc>,
        reason: CloseReason,
        exit_price: f64,
    ) -> Option<TradeRecord> {
        let position = self.position.take()?;
        let trade = TradeRecord::close(mode, &position, closed_at, reason, exit_price);
        self.equity += trade.pnl;
        if trade.pnl < 0.0 {
            self.consecutive_losses += 1;
        } else {
            self.consecutive_losses = 0;
        }
        Some(trade)
    }
}

/// Non-fatal per-bar condition recorded in the run result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "String")]
pub enum RunWarning {
    Indicator {
        at: DateTime<Utc>,
        error: IndicatorError,
    },
    RiskGuardBlock {
        at: DateTime<Utc>,
        reasons: Vec<GuardReason>,
    },
    QtyZeroAfterRisk {
        at: DateTime<Utc>,
    },
}

impl RunWarning {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            RunWarning::Indicator { at, .. }
            | RunWarning::RiskGuardBlock { at, .. }
            | RunWarning::QtyZeroAfterRisk { at } => *at,
        }
    }
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunWarning::Indicator { error, .. } => write!(f, "indicator_error:{error}"),
            RunWarning::RiskGuardBlock { reasons, .. } => {
                let joined: Vec<&str> = reasons.iter().map(GuardReason::as_str).collect();
                write!(f, "risk_guard_block:{}", joined.join(","))
            }
            RunWarning::QtyZeroAfterRisk { .. } => f.write_str("qty_zero_after_risk"),
        }
    }
}

impl From<RunWarning> for String {
    fn from(warning: RunWarning) -> Self {
        warning.to_string()
    }
}

/// Result of one mode's simulation.
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    pub mode: ExperimentMode,
    pub trades: Vec<TradeRecord>,
    /// One point per evaluated bar close, plus one per exit.
    pub equity_curve: Vec<EquityPoint>,
    pub decisions: Vec<DecisionRecord>,
    pub warnings: Vec<RunWarning>,
    pub initial_equity: f64,
    pub final_equity: f64,
    /// Fast bars after warmup, including ones skipped for short slow history.
    pub bars_evaluated: usize,
}

impl SimulationOutput {
    pub fn new(mode: ExperimentMode, initial_equity: f64) -> Self {
        Self {
            mode,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            decisions: Vec::new(),
            warnings: Vec::new(),
            initial_equity,
            final_equity: initial_equity,
            bars_evaluated: 0,
        }
    }
}
