//! Per-bar indicator snapshot consumed by the candidate generator and the AI snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Slow-timeframe trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "UP",
            Trend::Down => "DOWN",
            Trend::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-shape indicator values for the latest bar.
///
/// `fast` refers to the entry timeframe (4h bars), `slow` to the trend
/// timeframe (daily bars).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub price: f64,
    pub ema20_fast: f64,
    pub ema50_fast: f64,
    pub ema20_slow: f64,
    pub ema50_slow: f64,
    pub atr: f64,
    /// Rank of the current ATR within its trailing window, in [0, 1].
    pub atr_quantile: f64,
    pub distance_to_ema20_atr: f64,
    pub trend: Trend,
}
