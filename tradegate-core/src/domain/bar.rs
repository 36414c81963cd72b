//! Bar: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candle with UTC open and close timestamps.
///
/// A bar sequence handed to the engine must be strictly ascending by `open_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Finite prices with a consistent high/low envelope and non-inverted timestamps.
    pub fn is_sane(&self) -> bool {
        let finite = [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite());
        finite
            && self.high >= self.low
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
            && self.open > 0.0
            && self.close > 0.0
            && self.volume >= 0.0
            && self.close_time >= self.open_time
    }
}

/// True when every bar opens strictly after the previous one.
pub fn is_strictly_ascending(bars: &[Bar]) -> bool {
    bars.windows(2).all(|w| w[0].open_time < w[1].open_time)
}
