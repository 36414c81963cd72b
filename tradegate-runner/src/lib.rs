//! TradeGate Runner: suite orchestration on top of `tradegate-core`.
//!
//! This crate provides:
//! - TOML suite configuration with range validation
//! - OHLCV CSV loading, fast→slow aggregation, seeded synthetic bars
//! - Summary and per-segment metrics (drawdown with recovery)
//! - The Go/No-Go gate comparing AI modes against the baseline
//! - The suite coordinator running every mode in parallel
//! - Artifact export (CSV, JSON, Markdown)

pub mod config;
pub mod data_loader;
pub mod export;
pub mod gate;
pub mod metrics;
pub mod result;
pub mod runner;

pub use config::{AiConfig, ConfigError, SuiteConfig};
pub use data_loader::{
    load_market_data, synthetic_market_data, LoadError, MarketData,
};
pub use export::{write_backtest_artifacts, ExportError};
pub use gate::{evaluate_go_no_go, GateChecks, GoNoGo};
pub use metrics::{compute_segment_metrics, compute_summary_metrics, SummaryMetrics};
pub use result::{BacktestReport, ExperimentResult, SCHEMA_VERSION};
pub use runner::{build_provider, run_mode, run_suite, RunError};
