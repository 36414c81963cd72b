//! Indicator model for the trend-pullback strategy.
//!
//! The model consumes two bar series:
//! - fast (4h) bars for entry timing: EMA20/EMA50, ATR(14) and its quantile
//! - slow (daily) bars for the trend regime: EMA20/EMA50 direction and slope
//!
//! [`IndicatorModel`] is the seam the simulation depends on; the default
//! implementation is [`TrendPullbackIndicators`].

pub mod atr;
pub mod ema;

use thiserror::Error;

use crate::domain::{is_strictly_ascending, Bar, IndicatorSnapshot, Trend};

pub use atr::{atr_quantile, rolling_atr, true_range};
pub use ema::{ema_of_series, last_ema};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("input bars are empty")]
    EmptyInput,
    #[error("bar timestamps are not ascending")]
    NotAscending,
    #[error("insufficient history: need {required} bars, have {available}")]
    InsufficientHistory { required: usize, available: usize },
    #[error("ATR is not positive: {0}")]
    NonPositiveAtr(f64),
}

/// Computes an [`IndicatorSnapshot`] for the last fast bar.
pub trait IndicatorModel: Send + Sync {
    fn compute(&self, fast: &[Bar], slow: &[Bar]) -> Result<IndicatorSnapshot, IndicatorError>;
}

/// EMA/ATR snapshot with an EMA-slope trend classification.
#[derive(Debug, Clone)]
pub struct TrendPullbackIndicators {
    pub short_ema: usize,
    pub long_ema: usize,
    pub atr_period: usize,
    pub quantile_lookback: usize,
    /// Slow bars required before the trend can be anything but NEUTRAL.
    pub min_trend_bars: usize,
}

impl Default for TrendPullbackIndicators {
    fn default() -> Self {
        Self {
            short_ema: 20,
            long_ema: 50,
            atr_period: 14,
            quantile_lookback: 180,
            min_trend_bars: 60,
        }
    }
}

impl TrendPullbackIndicators {
    /// UP when the short EMA is above the long one and both rose on the last bar;
    /// DOWN for the mirror image; NEUTRAL otherwise or with too little history.
    pub fn classify_trend(&self, slow: &[Bar]) -> Trend {
        if slow.len() < self.min_trend_bars.max(2) {
            return Trend::Neutral;
        }
        let closes: Vec<f64> = slow.iter().map(|b| b.close).collect();
        let short = ema_of_series(&closes, self.short_ema);
        let long = ema_of_series(&closes, self.long_ema);
        let (Some(&s_last), Some(&l_last)) = (short.last(), long.last()) else {
            return Trend::Neutral;
        };
        let s_prev = short[short.len() - 2];
        let l_prev = long[long.len() - 2];

        if s_last > l_last && s_last > s_prev && l_last > l_prev {
            Trend::Up
        } else if s_last < l_last && s_last < s_prev && l_last < l_prev {
            Trend::Down
        } else {
            Trend::Neutral
        }
    }
}

impl IndicatorModel for TrendPullbackIndicators {
    fn compute(&self, fast: &[Bar], slow: &[Bar]) -> Result<IndicatorSnapshot, IndicatorError> {
        if fast.is_empty() || slow.is_empty() {
            return Err(IndicatorError::EmptyInput);
        }
        if !is_strictly_ascending(fast) || !is_strictly_ascending(slow) {
            return Err(IndicatorError::NotAscending);
        }

        let fast_closes: Vec<f64> = fast.iter().map(|b| b.close).collect();
        let slow_closes: Vec<f64> = slow.iter().map(|b| b.close).collect();

        let atr_series = rolling_atr(fast, self.atr_period);
        let atr = match atr_series.last() {
            Some(v) if !v.is_nan() => *v,
            _ => {
                return Err(IndicatorError::InsufficientHistory {
                    required: self.atr_period,
                    available: fast.len(),
                })
            }
        };
        if atr <= 0.0 {
            return Err(IndicatorError::NonPositiveAtr(atr));
        }

        // Non-empty inputs guarantee every EMA has a last value.
        let ema20_fast = last_ema(&fast_closes, self.short_ema).unwrap_or(f64::NAN);
        let ema50_fast = last_ema(&fast_closes, self.long_ema).unwrap_or(f64::NAN);
        let ema20_slow = last_ema(&slow_closes, self.short_ema).unwrap_or(f64::NAN);
        let ema50_slow = last_ema(&slow_closes, self.long_ema).unwrap_or(f64::NAN);
        let price = fast_closes[fast_closes.len() - 1];

        Ok(IndicatorSnapshot {
            price,
            ema20_fast,
            ema50_fast,
            ema20_slow,
            ema50_slow,
            atr,
            atr_quantile: atr_quantile(&atr_series, self.quantile_lookback),
            distance_to_ema20_atr: (price - ema20_fast).abs() / atr,
            trend: self.classify_trend(slow),
        })
    }
}

/// Create synthetic 4h bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    make_bars_every(closes, chrono::Duration::hours(4))
}

#[cfg(test)]
pub fn make_bars_every(closes: &[f64], step: chrono::Duration) -> Vec<Bar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let open_time = base + step * i as i32;
            Bar {
                open_time,
                close_time: open_time + step,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}
