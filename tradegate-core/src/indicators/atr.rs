//! Average True Range (ATR), simple rolling mean of true range.
//!
//! TR[0] = high - low; TR[t] = max(high - low, |high - close[t-1]|, |low - close[t-1]|).
//! ATR[t] is the mean of the last `period` TR values; NaN before `period - 1`.

use crate::domain::Bar;

pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut result = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let hl = (bar.high - bar.low).abs();
        let tr = if i == 0 {
            hl
        } else {
            let prev_close = bars[i - 1].close;
            hl.max((bar.high - prev_close).abs())
                .max((bar.low - prev_close).abs())
        };
        result.push(tr);
    }
    result
}

pub fn rolling_atr(bars: &[Bar], period: usize) -> Vec<f64> {
    let n = bars.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }
    let tr = true_range(bars);
    for i in (period - 1)..n {
        let window = &tr[i + 1 - period..=i];
        result[i] = window.iter().sum::<f64>() / period as f64;
    }
    result
}

/// Share of the trailing `lookback` defined ATR values that are <= the latest one.
///
/// Returns 1.0 when no ATR value is defined.
pub fn atr_quantile(atr_values: &[f64], lookback: usize) -> f64 {
    let defined: Vec<f64> = atr_values.iter().copied().filter(|v| !v.is_nan()).collect();
    let start = defined.len().saturating_sub(lookback.max(1));
    let sample = &defined[start..];
    match sample.last() {
        None => 1.0,
        Some(&current) => {
            let rank = sample.iter().filter(|&&v| v <= current).count();
            rank as f64 / sample.len() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn first_true_range_is_high_minus_low() {
        let bars = make_bars(&[100.0, 104.0]);
        let tr = true_range(&bars);
        assert!((tr[0] - 2.0).abs() < 1e-10);
        // open 100 close 104 -> high 105, low 99, prev close 100
        assert!((tr[1] - 6.0).abs() < 1e-10);
    }

    #[test]
    fn atr_lookback_gap() {
        let bars = make_bars(&[100.0; 20]);
        let atr = rolling_atr(&bars, 14);
        assert!(atr[12].is_nan());
        assert!((atr[13] - 2.0).abs() < 1e-10);
        assert!((atr[19] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn atr_short_input_all_nan() {
        let bars = make_bars(&[100.0; 5]);
        assert!(rolling_atr(&bars, 14).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn quantile_rank_of_latest() {
        let values = [f64::NAN, 1.0, 2.0, 3.0, 2.0];
        // last = 2.0; <= 2.0: 1,2,2 -> 3/4
        assert!((atr_quantile(&values, 180) - 0.75).abs() < 1e-10);
        // lookback 2 -> [3, 2] -> 1/2
        assert!((atr_quantile(&values, 2) - 0.5).abs() < 1e-10);
    }

    #[test]
    fn quantile_without_data_is_one() {
        assert_eq!(atr_quantile(&[f64::NAN, f64::NAN], 180), 1.0);
        assert_eq!(atr_quantile(&[], 180), 1.0);
    }
}
