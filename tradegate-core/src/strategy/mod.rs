//! Candidate generation.
//!
//! A [`CandidateGenerator`] turns an indicator snapshot into at most one
//! trade proposal per bar. It knows nothing about positions or risk.

pub mod pullback;

pub use pullback::TrendPullback;

use chrono::{DateTime, Utc};

use crate::domain::{IndicatorSnapshot, TradeCandidate};

/// Per-bar inputs that do not come from indicators.
#[derive(Debug, Clone, Copy)]
pub struct CandidateContext<'a> {
    pub symbol: &'a str,
    /// Close time of the bar the snapshot was computed on.
    pub timestamp: DateTime<Utc>,
    pub funding_rate: Option<f64>,
    pub open_interest: Option<f64>,
}

pub trait CandidateGenerator: Send + Sync {
    fn name(&self) -> &str;

    fn generate(
        &self,
        snapshot: &IndicatorSnapshot,
        ctx: &CandidateContext<'_>,
    ) -> Option<TradeCandidate>;
}
