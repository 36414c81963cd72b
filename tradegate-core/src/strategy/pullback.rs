//! Long-only trend pullback: slow trend UP, price near the fast EMA20,
//! volatility not extreme.

use crate::config::StrategyConfig;
use crate::domain::{IndicatorSnapshot, Side, TradeCandidate, Trend};

use super::{CandidateContext, CandidateGenerator};

pub const REASON_TREND_UP: &str = "trend_up_1d";
pub const REASON_PULLBACK: &str = "pullback_near_ema20_4h";
pub const REASON_ATR_OK: &str = "atr_not_extreme";

#[derive(Debug, Clone, Default)]
pub struct TrendPullback {
    config: StrategyConfig,
}

impl TrendPullback {
    pub fn new(config: StrategyConfig) -> Self {
        Self { config }
    }
}

impl CandidateGenerator for TrendPullback {
    fn name(&self) -> &str {
        "trend_pullback"
    }

    fn generate(
        &self,
        snapshot: &IndicatorSnapshot,
        ctx: &CandidateContext<'_>,
    ) -> Option<TradeCandidate> {
        if snapshot.trend != Trend::Up {
            return None;
        }
        if snapshot.atr <= 0.0 {
            return None;
        }
        if snapshot.atr_quantile > self.config.atr_high_quantile {
            return None;
        }
        if snapshot.distance_to_ema20_atr > self.config.pullback_atr_threshold {
            return None;
        }

        Some(TradeCandidate {
            symbol: ctx.symbol.to_string(),
            side: Side::Long,
            entry_price: snapshot.price,
            atr: snapshot.atr,
            ema20_fast: snapshot.ema20_fast,
            ema50_slow: snapshot.ema50_slow,
            trend: Trend::Up,
            funding_rate: ctx.funding_rate,
            open_interest: ctx.open_interest,
            reasons: vec![
                REASON_TREND_UP.to_string(),
                REASON_PULLBACK.to_string(),
                REASON_ATR_OK.to_string(),
            ],
            created_at: ctx.timestamp,
        })
    }
}
