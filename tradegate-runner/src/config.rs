//! Suite configuration loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid configuration.
//! `validate()` enforces the hard ranges on risk and strategy parameters.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use tradegate_core::ai::{ProviderKind, RemoteConfig, RetryPolicy, OPENROUTER_URL};
use tradegate_core::domain::SegmentSpec;
use tradegate_core::{RiskConfig, SimulationConfig, StrategyConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// AI provider settings. The API key is never part of the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AiConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Heuristic,
            model: "openai/gpt-4o-mini".to_string(),
            endpoint: OPENROUTER_URL.to_string(),
            timeout_secs: 30,
            retry: RetryPolicy::default(),
        }
    }
}

impl AiConfig {
    pub fn remote_config(&self, api_key: Option<String>) -> RemoteConfig {
        RemoteConfig {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            api_key,
            timeout: Duration::from_secs(self.timeout_secs),
            retry: self.retry.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteConfig {
    pub backtest: SimulationConfig,
    pub risk: RiskConfig,
    pub strategy: StrategyConfig,
    pub ai: AiConfig,
    /// Explicit segments; when empty the suite splits the baseline curve in two.
    pub segments: Vec<SegmentSpec>,
}

impl SuiteConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: SuiteConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.risk;
        check_range("risk.risk_per_trade_pct", r.risk_per_trade_pct, 0.1, 2.0)?;
        check_range("risk.stop_loss_atr_multiplier", r.stop_loss_atr_multiplier, 1.0, 5.0)?;
        check_range("risk.max_holding_days", f64::from(r.max_holding_days), 1.0, 30.0)?;
        check_range(
            "risk.max_consecutive_losses",
            f64::from(r.max_consecutive_losses),
            1.0,
            10.0,
        )?;
        check_range("risk.max_weekly_drawdown_pct", r.max_weekly_drawdown_pct, 1.0, 10.0)?;
        check_range("risk.max_total_exposure_pct", r.max_total_exposure_pct, 1.0, 50.0)?;

        let s = &self.strategy;
        check_range("strategy.pullback_atr_threshold", s.pullback_atr_threshold, 0.1, 2.0)?;
        check_range("strategy.atr_high_quantile", s.atr_high_quantile, 0.5, 0.99)?;

        let b = &self.backtest;
        let symbol_ok = !b.symbol.is_empty()
            && b.symbol
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
        if !symbol_ok {
            return Err(ConfigError::Invalid(format!(
                "backtest.symbol must be uppercase alphanumeric, got '{}'",
                b.symbol
            )));
        }
        if b.initial_equity.is_nan() || b.initial_equity <= 0.0 {
            return Err(ConfigError::Invalid(
                "backtest.initial_equity must be positive".to_string(),
            ));
        }
        if b.slippage_bps.is_nan() || b.slippage_bps < 0.0 {
            return Err(ConfigError::Invalid(
                "backtest.slippage_bps must be non-negative".to_string(),
            ));
        }
        if b.warmup_bars == 0 {
            return Err(ConfigError::Invalid(
                "backtest.warmup_bars must be positive".to_string(),
            ));
        }
        if self.ai.timeout_secs == 0 {
            return Err(ConfigError::Invalid("ai.timeout_secs must be positive".to_string()));
        }
        if self.ai.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "ai.retry.max_attempts must be at least 1".to_string(),
            ));
        }
        for segment in &self.segments {
            if segment.start > segment.end {
                return Err(ConfigError::Invalid(format!(
                    "segment '{}' starts after it ends",
                    segment.name
                )));
            }
        }
        Ok(())
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value.is_nan() || value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradegate_core::risk::RiskBudgetPolicy;

    #[test]
    fn empty_toml_is_all_defaults() {
        let config = SuiteConfig::from_toml("").unwrap();
        assert_eq!(config, SuiteConfig::default());
        assert_eq!(config.backtest.symbol, "BTCUSDT");
        assert_eq!(config.risk.max_holding_days, 7);
        assert_eq!(config.ai.retry.max_attempts, 3);
    }

    #[test]
    fn parses_sections() {
        let text = r#"
            [backtest]
            symbol = "ETHUSDT"
            warmup_bars = 120

            [risk]
            risk_per_trade_pct = 1.0
            budget_policy = "cycle_gated"

            [strategy]
            atr_high_quantile = 0.9

            [ai]
            provider = "remote"
            model = "anthropic/claude-3.5-sonnet"

            [[segments]]
            name = "h1"
            start = "2024-01-01T00:00:00Z"
            end = "2024-06-30T23:59:59Z"
        "#;
        let config = SuiteConfig::from_toml(text).unwrap();
        assert_eq!(config.backtest.symbol, "ETHUSDT");
        assert_eq!(config.backtest.warmup_bars, 120);
        assert_eq!(config.risk.budget_policy, RiskBudgetPolicy::CycleGated);
        assert_eq!(config.ai.provider, ProviderKind::Remote);
        assert_eq!(config.segments.len(), 1);
        assert_eq!(config.segments[0].name, "h1");
    }

    #[test]
    fn out_of_range_is_rejected() {
        let err = SuiteConfig::from_toml("[risk]\nrisk_per_trade_pct = 3.0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange { field: "risk.risk_per_trade_pct", .. }
        ));
        let err = SuiteConfig::from_toml("[strategy]\natr_high_quantile = 0.2").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { .. }));
        let err = SuiteConfig::from_toml("[risk]\nmax_holding_days = 45").unwrap_err();
        assert!(err.to_string().contains("risk.max_holding_days"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            SuiteConfig::from_toml("[risk]\nleverage = 5"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn bad_symbol_and_equity_rejected() {
        assert!(SuiteConfig::from_toml("[backtest]\nsymbol = \"btc-usdt\"").is_err());
        assert!(SuiteConfig::from_toml("[backtest]\ninitial_equity = 0.0").is_err());
        assert!(SuiteConfig::from_toml("[backtest]\nwarmup_bars = 0").is_err());
    }

    #[test]
    fn remote_config_carries_key_and_timeout() {
        let ai = AiConfig::default();
        let remote = ai.remote_config(Some("key".into()));
        assert_eq!(remote.timeout, Duration::from_secs(30));
        assert_eq!(remote.api_key.as_deref(), Some("key"));
        assert_eq!(remote.endpoint, OPENROUTER_URL);
    }

    #[test]
    fn toml_round_trip_preserves_values() {
        let mut config = SuiteConfig::default();
        config.risk.max_consecutive_losses = 5;
        let text = config.to_toml().unwrap();
        assert_eq!(SuiteConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SuiteConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
