//! Suite coordinator: run every experiment mode over the same data, attach
//! segment metrics, and evaluate the Go/No-Go gate.
//!
//! Two entry points:
//! - `run_mode()`: one simulation plus its summary metrics.
//! - `run_suite()`: all modes in parallel, segments, verdict. Used by the CLI.

use std::collections::BTreeMap;

use chrono::Utc;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use tradegate_core::ai::{AiProvider, DecisionProvider, HeuristicProvider, ProviderKind, RemoteProvider, TransportError};
use tradegate_core::domain::{ExperimentMode, SegmentSpec};
use tradegate_core::engine::{run_simulation, SimulationError};
use tradegate_core::indicators::TrendPullbackIndicators;
use tradegate_core::risk::RiskEngine;
use tradegate_core::strategy::TrendPullback;

use crate::config::{AiConfig, ConfigError, SuiteConfig};
use crate::data_loader::{LoadError, MarketData};
use crate::export::ExportError;
use crate::gate::evaluate_go_no_go;
use crate::metrics::build_default_segments;
use crate::result::{BacktestReport, ExperimentResult, SCHEMA_VERSION};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
    #[error("provider error: {0}")]
    Provider(#[from] TransportError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

/// Build the decision provider named in the `[ai]` section.
///
/// The API key only matters for the remote provider; a missing key is not an
/// error here; every remote call then degrades to the rules-only fallback.
pub fn build_provider(ai: &AiConfig, api_key: Option<String>) -> Result<AiProvider, RunError> {
    let provider = match ai.provider {
        ProviderKind::Heuristic => AiProvider::Heuristic(HeuristicProvider),
        ProviderKind::Remote => {
            if api_key.is_none() {
                warn!("remote provider selected without an API key; AI modes will degrade");
            }
            AiProvider::Remote(RemoteProvider::new(ai.remote_config(api_key))?)
        }
    };
    Ok(provider)
}

/// Run one experiment mode and compute its summary metrics.
pub fn run_mode(
    mode: ExperimentMode,
    config: &SuiteConfig,
    data: &MarketData,
    provider: &dyn DecisionProvider,
) -> Result<ExperimentResult, RunError> {
    let risk = RiskEngine::new(config.risk.clone());
    let indicators = TrendPullbackIndicators::default();
    let candidates = TrendPullback::new(config.strategy.clone());

    let output = run_simulation(
        mode,
        &data.fast,
        &data.slow,
        &config.backtest,
        &risk,
        &indicators,
        &candidates,
        provider,
    )?;

    let result = ExperimentResult::from_output(output);
    info!(
        mode = %mode,
        trades = result.metrics.trade_count,
        total_return_pct = result.metrics.total_return_pct,
        max_drawdown_pct = result.metrics.max_drawdown_pct,
        warnings = result.warnings.len(),
        degraded = result.degraded_decisions(),
        "mode finished"
    );
    Ok(result)
}

/// Run baseline and both AI modes over the same data.
///
/// `segments` empty means: split the baseline equity curve into two halves.
/// Modes share no state, so they run in parallel.
pub fn run_suite(
    config: &SuiteConfig,
    data: &MarketData,
    provider: &dyn DecisionProvider,
    segments: &[SegmentSpec],
) -> Result<BacktestReport, RunError> {
    config.validate()?;
    let started_at = Utc::now();
    info!(
        symbol = %config.backtest.symbol,
        source = %data.source,
        fast_bars = data.fast.len(),
        slow_bars = data.slow.len(),
        provider = provider.name(),
        "suite started"
    );

    let results: Vec<ExperimentResult> = ExperimentMode::ALL
        .par_iter()
        .map(|&mode| run_mode(mode, config, data, provider))
        .collect::<Result<_, _>>()?;
    let mut experiments: BTreeMap<ExperimentMode, ExperimentResult> =
        results.into_iter().map(|r| (r.mode, r)).collect();

    let segments = if segments.is_empty() {
        experiments
            .get(&ExperimentMode::Baseline)
            .map(|baseline| build_default_segments(&baseline.equity_curve))
            .unwrap_or_default()
    } else {
        segments.to_vec()
    };
    for result in experiments.values_mut() {
        result.attach_segments(&segments);
    }

    let go_no_go = evaluate_go_no_go(&experiments);
    info!(
        go = go_no_go.go,
        selected_ai_mode = ?go_no_go.selected_ai_mode,
        segments = segments.len(),
        "suite finished"
    );

    Ok(BacktestReport {
        schema_version: SCHEMA_VERSION,
        symbol: config.backtest.symbol.clone(),
        started_at,
        source: data.source.clone(),
        dataset_hash: data.dataset_hash.clone(),
        segments,
        experiments,
        go_no_go,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::synthetic_market_data;
    use tradegate_core::ai::FixedProvider;
    use tradegate_core::domain::AiDecision;

    fn small_config() -> SuiteConfig {
        let mut config = SuiteConfig::default();
        config.backtest.warmup_bars = 60;
        config.backtest.min_slow_bars = 20;
        config
    }

    #[test]
    fn heuristic_provider_needs_no_key() {
        let provider = build_provider(&AiConfig::default(), None).unwrap();
        assert!(matches!(provider, AiProvider::Heuristic(_)));
    }

    #[test]
    fn short_slow_history_still_classifies_trend_from_sixty_bars() {
        // 59 daily bars clear min_slow_bars = 20 but stay NEUTRAL below 60.
        let config = small_config();
        let data = synthetic_market_data("BTCUSDT", 6 * 59);
        let provider = FixedProvider::decision(AiDecision::baseline());
        let result = run_mode(ExperimentMode::Baseline, &config, &data, &provider).unwrap();
        assert!(result.decisions.is_empty());
        assert!(result.trades.is_empty());
    }

    #[test]
    fn suite_runs_every_mode() {
        let config = small_config();
        let data = synthetic_market_data("BTCUSDT", 600);
        let provider = FixedProvider::decision(AiDecision::baseline());
        let report = run_suite(&config, &data, &provider, &[]).unwrap();

        assert_eq!(report.experiments.len(), 3);
        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert_eq!(report.dataset_hash, data.dataset_hash);
        assert_eq!(report.segments.len(), 2);
        for result in report.experiments.values() {
            assert_eq!(result.segment_metrics.len(), 2);
        }
    }

    #[test]
    fn insufficient_bars_is_an_error() {
        let config = SuiteConfig::default();
        let data = synthetic_market_data("BTCUSDT", 50);
        let provider = FixedProvider::decision(AiDecision::baseline());
        let err = run_suite(&config, &data, &provider, &[]).unwrap_err();
        assert!(matches!(err, RunError::Simulation(_)));
    }
}
