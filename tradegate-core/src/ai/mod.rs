//! AI gate: decision providers and strict response parsing.
//!
//! - [`DecisionProvider`] is the seam the simulation calls for non-baseline modes
//! - [`HeuristicProvider`] is deterministic and offline
//! - [`RemoteProvider`] calls an OpenRouter-compatible chat-completions API
//! - [`FixedProvider`] returns a canned result (tests, dry runs)
//!
//! Providers return `Err(TransportError)` only when the call itself failed.
//! Malformed model output is never an error: it parses to a DENY decision
//! flagged `INVALID_RESPONSE`.

pub mod fixed;
pub mod heuristic;
pub mod parse;
pub mod remote;
pub mod retry;

pub use fixed::FixedProvider;
pub use heuristic::HeuristicProvider;
pub use parse::{parse_response_text, parse_strict};
pub use remote::{RemoteConfig, RemoteProvider, OPENROUTER_URL};
pub use retry::RetryPolicy;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{AiDecision, MarketSnapshot};

/// The provider call could not produce a response.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    #[error("missing_api_key")]
    MissingApiKey,
    #[error("http_status_{0}")]
    Status(u16),
    #[error("request_failed: {0}")]
    Request(String),
    #[error("client_build_failed: {0}")]
    Client(String),
}

impl TransportError {
    /// Missing credentials will not fix themselves on retry.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::MissingApiKey | TransportError::Client(_))
    }
}

pub trait DecisionProvider: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, snapshot: &MarketSnapshot) -> Result<AiDecision, TransportError>;
}

/// Which provider backs the AI modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Heuristic,
    Remote,
}

/// Closed set of providers the runner can build from configuration.
#[derive(Debug)]
pub enum AiProvider {
    Heuristic(HeuristicProvider),
    Remote(RemoteProvider),
    Fixed(FixedProvider),
}

impl DecisionProvider for AiProvider {
    fn name(&self) -> &str {
        match self {
            AiProvider::Heuristic(p) => p.name(),
            AiProvider::Remote(p) => p.name(),
            AiProvider::Fixed(p) => p.name(),
        }
    }

    fn evaluate(&self, snapshot: &MarketSnapshot) -> Result<AiDecision, TransportError> {
        match self {
            AiProvider::Heuristic(p) => p.evaluate(snapshot),
            AiProvider::Remote(p) => p.evaluate(snapshot),
            AiProvider::Fixed(p) => p.evaluate(snapshot),
        }
    }
}
