//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: EMA[0] = x[0]. Every index carries a value, no lookback gap.

/// EMA of an arbitrary series. Empty output for an empty input or `period == 0`.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return Vec::new();
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &value in values {
        let next = match prev {
            None => value,
            Some(p) => alpha * value + (1.0 - alpha) * p,
        };
        result.push(next);
        prev = Some(next);
    }
    result
}

/// Last value of the EMA, if any.
pub fn last_ema(values: &[f64], period: usize) -> Option<f64> {
    ema_of_series(values, period).last().copied()
}
