//! OpenRouter chat-completions provider.

use serde_json::{json, Value};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::info;

use crate::domain::{AiDecision, MarketSnapshot, FLAG_INVALID_RESPONSE};

use super::parse::parse_response_text;
use super::retry::RetryPolicy;
use super::{DecisionProvider, TransportError};

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You are a risk gatekeeper. Return only JSON with keys: \
decision, confidence, risk_flags, key_reasons.";

#[derive(Clone)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

#[derive(Debug)]
pub struct RemoteProvider {
    config: RemoteConfig,
    client: reqwest::blocking::Client,
}

impl RemoteProvider {
    pub fn new(config: RemoteConfig) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn request_payload(&self, snapshot: &MarketSnapshot) -> Result<Value, TransportError> {
        let snapshot_json = serde_json::to_string(snapshot)
            .map_err(|e| TransportError::Request(format!("snapshot_encode: {e}")))?;
        Ok(json!({
            "model": self.model(),
            "temperature": 0,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!(
                        "Evaluate this candidate for 3-7 day swing. Snapshot: {snapshot_json}"
                    ),
                },
            ],
        }))
    }

    fn request_completion(&self, payload: &Value) -> Result<String, TransportError> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => return Err(TransportError::MissingApiKey),
        };
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(payload)
            .send()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        let body: Value = response
            .json()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(message_content(&body))
    }
}

/// Assistant text from `choices[0].message.content`; `"{}"` when absent.
pub fn message_content(body: &Value) -> String {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .unwrap_or("{}")
        .to_string()
}

impl DecisionProvider for RemoteProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn evaluate(&self, snapshot: &MarketSnapshot) -> Result<AiDecision, TransportError> {
        let started = Instant::now();
        let payload = self.request_payload(snapshot)?;
        let content = match self.config.retry.run(|| self.request_completion(&payload)) {
            Ok(content) => content,
            Err(e) => {
                info!(
                    target: "llm_call",
                    model = self.model(),
                    success = false,
                    latency_ms = started.elapsed().as_secs_f64() * 1000.0,
                    reason = "api_error",
                    error = %e
                );
                return Err(e);
            }
        };

        let decision = parse_response_text(&content);
        info!(
            target: "llm_call",
            model = self.model(),
            success = decision.counts_as_call_success(),
            latency_ms = started.elapsed().as_secs_f64() * 1000.0,
            decision = %decision.decision,
            invalid_response = decision.has_flag(FLAG_INVALID_RESPONSE)
        );
        Ok(decision)
    }
}
