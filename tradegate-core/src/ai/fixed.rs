use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::{AiDecision, MarketSnapshot};

use super::{DecisionProvider, TransportError};

/// Returns the same result for every snapshot and counts calls.
#[derive(Debug)]
pub struct FixedProvider {
    response: Result<AiDecision, TransportError>,
    calls: AtomicUsize,
}

impl FixedProvider {
    pub fn decision(decision: AiDecision) -> Self {
        Self {
            response: Ok(decision),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: TransportError) -> Self {
        Self {
            response: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl DecisionProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    fn evaluate(&self, _snapshot: &MarketSnapshot) -> Result<AiDecision, TransportError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.response.clone()
    }
}
