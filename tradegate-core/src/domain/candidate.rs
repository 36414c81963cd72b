use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::snapshot::Trend;

/// Position side. The strategy is long-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Long,
}

/// A trade proposal produced by the candidate generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeCandidate {
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub atr: f64,
    pub ema20_fast: f64,
    pub ema50_slow: f64,
    pub trend: Trend,
    pub funding_rate: Option<f64>,
    pub open_interest: Option<f64>,
    pub reasons: Vec<String>,
    pub created_at: DateTime<Utc>,
}
