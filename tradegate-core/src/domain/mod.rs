//! Domain types for the trade-gate engine.

pub mod bar;
pub mod candidate;
pub mod decision;
pub mod equity;
pub mod market;
pub mod mode;
pub mod position;
pub mod snapshot;
pub mod trade;

pub use bar::{is_strictly_ascending, Bar};
pub use candidate::{Side, TradeCandidate};
pub use decision::{AiDecision, Decision, DecisionRecord, FLAG_AI_UNAVAILABLE, FLAG_INVALID_RESPONSE};
pub use equity::{EquityPoint, SegmentError, SegmentSpec};
pub use market::{AtrLabel, EventRisk, MarketSnapshot, SnapshotIndicators};
pub use mode::ExperimentMode;
pub use position::Position;
pub use snapshot::{IndicatorSnapshot, Trend};
pub use trade::{CloseReason, TradeRecord};
