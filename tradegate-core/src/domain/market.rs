//! Normalized market snapshot handed to decision providers.

use serde::{Deserialize, Serialize};

use super::candidate::{Side, TradeCandidate};
use super::snapshot::{IndicatorSnapshot, Trend};

pub const CANDIDATE_TYPE_TREND_PULLBACK: &str = "Trend Pullback";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AtrLabel {
    Low,
    Normal,
    High,
}

impl AtrLabel {
    /// LOW below 0.33, NORMAL below 0.8, HIGH otherwise.
    pub fn from_quantile(quantile: f64) -> Self {
        if quantile < 0.33 {
            AtrLabel::Low
        } else if quantile < 0.8 {
            AtrLabel::Normal
        } else {
            AtrLabel::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventRisk {
    Yes,
    #[default]
    No,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotIndicators {
    pub price: f64,
    #[serde(rename = "ema20_4h")]
    pub ema20_fast: f64,
    #[serde(rename = "ema50_1d")]
    pub ema50_slow: f64,
    #[serde(rename = "atr_14_4h")]
    pub atr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub trend: Trend,
    pub atr_quantile: f64,
    pub atr_label: AtrLabel,
    pub funding_rate: Option<f64>,
    pub funding_available: bool,
    pub open_interest: Option<f64>,
    pub open_interest_available: bool,
    pub event_risk: EventRisk,
    pub candidate_type: String,
    pub position_side: Side,
    pub indicators: SnapshotIndicators,
}

impl MarketSnapshot {
    pub fn from_candidate(candidate: &TradeCandidate, snapshot: &IndicatorSnapshot) -> Self {
        let atr_quantile = snapshot.atr_quantile.clamp(0.0, 1.0);
        Self {
            symbol: candidate.symbol.clone(),
            trend: candidate.trend,
            atr_quantile,
            atr_label: AtrLabel::from_quantile(atr_quantile),
            funding_rate: candidate.funding_rate,
            funding_available: candidate.funding_rate.is_some(),
            open_interest: candidate.open_interest,
            open_interest_available: candidate.open_interest.is_some(),
            event_risk: EventRisk::No,
            candidate_type: CANDIDATE_TYPE_TREND_PULLBACK.to_string(),
            position_side: candidate.side,
            indicators: SnapshotIndicators {
                price: snapshot.price,
                ema20_fast: snapshot.ema20_fast,
                ema50_slow: snapshot.ema50_slow,
                atr: snapshot.atr,
            },
        }
    }
}
