//! TradeGate Core: domain types, indicators, risk rules, AI gate, and the simulation loop.
//!
//! This crate contains the heart of the gated backtest:
//! - Domain types (bars, candidates, decisions, positions, trades, equity points)
//! - Trend-pullback indicator model and candidate generator
//! - Hard risk rules (global guards, ATR stop, risk-budget sizing, time stop)
//! - AI decision providers with strict response parsing
//! - Bar-by-bar simulation for one experiment mode

pub mod ai;
pub mod config;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod risk;
pub mod strategy;
pub mod time;

pub use config::{RiskConfig, SimulationConfig, StrategyConfig};
pub use engine::{run_simulation, Simulation, SimulationError, SimulationOutput};
