use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::snapshot::Trend;

/// Mark-to-market equity at a bar close, tagged with the trend regime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    pub regime: Trend,
}

impl EquityPoint {
    pub fn new(timestamp: DateTime<Utc>, equity: f64, regime: Trend) -> Self {
        Self {
            timestamp,
            equity,
            regime,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SegmentError {
    #[error("segment '{name}' starts after it ends")]
    Inverted { name: String },
    #[error("segment name must not be empty")]
    EmptyName,
}

/// Named inclusive time window used for segment metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpec {
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SegmentSpec {
    pub fn new(
        name: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, SegmentError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SegmentError::EmptyName);
        }
        if start > end {
            return Err(SegmentError::Inverted { name });
        }
        Ok(Self { name, start, end })
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}
