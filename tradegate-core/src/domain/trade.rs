//! Closed trade records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::decision::Decision;
use super::mode::ExperimentMode;
use super::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    StopLoss,
    TimeStop,
    EndOfData,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::StopLoss => "stop_loss",
            CloseReason::TimeStop => "time_stop",
            CloseReason::EndOfData => "end_of_data",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed round-trip.
///
/// Prices are fills (slippage already applied). `pnl` is what the account
/// actually booked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub mode: ExperimentMode,
    pub symbol: String,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    pub close_reason: CloseReason,
    pub qty: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub stop_loss: f64,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub ai_decision: Decision,
    pub ai_confidence: f64,
}

impl TradeRecord {
    /// Build the record for `position` exiting at `exit_price` (a fill).
    pub fn close(
        mode: ExperimentMode,
        position: &Position,
        closed_at: DateTime<Utc>,
        close_reason: CloseReason,
        exit_price: f64,
    ) -> Self {
        let pnl = (exit_price - position.entry_price) * position.qty;
        let notional = position.notional();
        let pnl_pct = if notional != 0.0 {
            pnl / notional * 100.0
        } else {
            0.0
        };
        Self {
            mode,
            symbol: position.symbol.clone(),
            opened_at: position.opened_at,
            closed_at,
            close_reason,
            qty: position.qty,
            entry_price: position.entry_price,
            exit_price,
            stop_loss: position.stop_loss,
            pnl,
            pnl_pct,
            ai_decision: position.ai_decision,
            ai_confidence: position.ai_confidence,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}
