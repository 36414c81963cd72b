//! Open position held by a simulation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::decision::Decision;

/// A long position. `entry_price` is the slippage-adjusted fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub qty: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub opened_at: DateTime<Utc>,
    pub ai_decision: Decision,
    pub ai_confidence: f64,
}

impl Position {
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.qty
    }

    pub fn notional(&self) -> f64 {
        self.entry_price * self.qty
    }
}
