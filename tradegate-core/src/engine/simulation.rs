//! Bar-by-bar simulation of one experiment mode.
//!
//! Per fast bar after warmup:
//! 1. Roll the weekly equity watermark, gather slow bars closed by now
//! 2. Compute indicators (errors become warnings, bar skipped)
//! 3. With a position: stop-loss, then time stop, else mark to market
//! 4. Flat: candidate -> AI gate -> global guards -> sizing -> entry
//!
//! Any position still open after the last bar is closed at its close.

use tracing::{debug, warn};

use crate::ai::DecisionProvider;
use crate::config::SimulationConfig;
use crate::domain::{
    is_strictly_ascending, AiDecision, Bar, CloseReason, DecisionRecord, EquityPoint,
    ExperimentMode, MarketSnapshot, Position, Trend,
};
use crate::indicators::IndicatorModel;
use crate::risk::{AccountStats, RiskEngine};
use crate::strategy::{CandidateContext, CandidateGenerator};

use super::state::{RunWarning, SimulationError, SimulationOutput, SimulationState};

/// Decision applied to an entry, and whether it came from the transport fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDecision {
    pub decision: AiDecision,
    pub degraded: bool,
}

/// Everything one mode's run depends on. Borrowed so modes can share components.
pub struct Simulation<'a> {
    pub mode: ExperimentMode,
    pub config: &'a SimulationConfig,
    pub risk: &'a RiskEngine,
    pub indicators: &'a dyn IndicatorModel,
    pub candidates: &'a dyn CandidateGenerator,
    pub provider: &'a dyn DecisionProvider,
}

impl<'a> Simulation<'a> {
    /// Gate decision for a snapshot. Baseline never calls the provider.
    pub fn resolve_decision(&self, snapshot: &MarketSnapshot) -> ResolvedDecision {
        if !self.mode.consults_ai() {
            return ResolvedDecision {
                decision: AiDecision::baseline(),
                degraded: false,
            };
        }
        match self.provider.evaluate(snapshot) {
            Ok(decision) => ResolvedDecision {
                decision,
                degraded: false,
            },
            Err(e) => {
                warn!(mode = %self.mode, provider = self.provider.name(), error = %e, "AI unavailable, using degraded decision");
                ResolvedDecision {
                    decision: AiDecision::degraded(&e),
                    degraded: true,
                }
            }
        }
    }

    /// Exit for the open position on this bar: stop-loss first, then time stop.
    /// Returns the raw (pre-slippage) exit price.
    fn exit_signal(&self, position: &Position, bar: &Bar) -> Option<(CloseReason, f64)> {
        if bar.low <= position.stop_loss {
            return Some((CloseReason::StopLoss, position.stop_loss));
        }
        if self.risk.time_stop_hit(position.opened_at, bar.close_time) {
            return Some((CloseReason::TimeStop, bar.close));
        }
        None
    }

    pub fn run(&self, fast: &[Bar], slow: &[Bar]) -> Result<SimulationOutput, SimulationError> {
        let warmup = self.config.warmup_bars;
        if warmup == 0 {
            return Err(SimulationError::InvalidWarmup);
        }
        if fast.len() <= warmup {
            return Err(SimulationError::InsufficientBars {
                warmup,
                available: fast.len(),
            });
        }
        if !is_strictly_ascending(fast) {
            return Err(SimulationError::UnorderedBars { series: "fast" });
        }
        if !is_strictly_ascending(slow) {
            return Err(SimulationError::UnorderedBars { series: "slow" });
        }

        let slippage = self.config.slippage_fraction();
        let mut state = SimulationState::new(self.config.initial_equity);
        let mut out = SimulationOutput::new(self.mode, self.config.initial_equity);
        let mut slow_end = 0;

        for idx in warmup..fast.len() {
            let bar = &fast[idx];
            let now = bar.close_time;
            out.bars_evaluated += 1;
            state.roll_week(now);

            while slow_end < slow.len() && slow[slow_end].close_time <= now {
                slow_end += 1;
            }
            if slow_end < self.config.min_slow_bars {
                continue;
            }

            let snapshot = match self.indicators.compute(&fast[..=idx], &slow[..slow_end]) {
                Ok(snapshot) => snapshot,
                Err(error) => {
                    debug!(%now, %error, "indicator error, skipping bar");
                    out.warnings.push(RunWarning::Indicator { at: now, error });
                    continue;
                }
            };
            let regime = snapshot.trend;

            // Position open: exits only, never a new entry on the same bar.
            if let Some(position) = state.position.as_ref() {
                let exit = self.exit_signal(position, bar);
                let unrealized = position.unrealized_pnl(bar.close);
                match exit {
                    Some((reason, raw_price)) => {
                        let fill = raw_price * (1.0 - slippage);
                        if let Some(trade) = state.close_position(self.mode, now, reason, fill) {
                            debug!(mode = %self.mode, %now, %reason, pnl = trade.pnl, "position closed");
                            out.trades.push(trade);
                        }
                        out.equity_curve
                            .push(EquityPoint::new(now, state.equity, regime));
                    }
                    None => {
                        out.equity_curve
                            .push(EquityPoint::new(now, state.equity + unrealized, regime));
                    }
                }
                continue;
            }

            // Flat.
            out.equity_curve
                .push(EquityPoint::new(now, state.equity, regime));

            let ctx = CandidateContext {
                symbol: &self.config.symbol,
                timestamp: now,
                funding_rate: None,
                open_interest: None,
            };
            let candidate = match self.candidates.generate(&snapshot, &ctx) {
                Some(candidate) => candidate,
                None => continue,
            };

            let market = MarketSnapshot::from_candidate(&candidate, &snapshot);
            let resolved = self.resolve_decision(&market);
            out.decisions.push(DecisionRecord::new(
                now,
                self.mode,
                &resolved.decision,
                resolved.degraded,
            ));
            if self.mode.consults_ai() && resolved.decision.is_deny() {
                continue;
            }

            let stats = AccountStats {
                consecutive_losses: state.consecutive_losses,
                weekly_drawdown_pct: state.weekly_drawdown_pct(),
                total_exposure_pct: 0.0,
            };
            let guard = self.risk.check_global_guards(&stats);
            if !guard.allowed {
                out.warnings.push(RunWarning::RiskGuardBlock {
                    at: now,
                    reasons: guard.reasons,
                });
                continue;
            }

            let budget = self
                .risk
                .risk_budget(self.mode, &resolved.decision, resolved.degraded);
            let stop = self.risk.stop_loss(candidate.entry_price, candidate.atr);
            let qty = self
                .risk
                .position_size(state.equity, candidate.entry_price, stop, budget)
                .min(self.risk.exposure_cap(state.equity, candidate.entry_price));
            if qty <= 0.0 {
                out.warnings.push(RunWarning::QtyZeroAfterRisk { at: now });
                continue;
            }

            debug!(mode = %self.mode, %now, qty, stop, "position opened");
            state.open_position(Position {
                symbol: candidate.symbol,
                qty,
                entry_price: candidate.entry_price * (1.0 + slippage),
                stop_loss: stop,
                opened_at: now,
                ai_decision: resolved.decision.decision,
                ai_confidence: resolved.decision.confidence,
            });
        }

        if let Some(last) = fast.last() {
            let regime = out
                .equity_curve
                .last()
                .map(|p| p.regime)
                .unwrap_or(Trend::Neutral);
            let fill = last.close * (1.0 - slippage);
            if let Some(trade) =
                state.close_position(self.mode, last.close_time, CloseReason::EndOfData, fill)
            {
                out.trades.push(trade);
                out.equity_curve
                    .push(EquityPoint::new(last.close_time, state.equity, regime));
            }
        }

        out.final_equity = state.equity;
        Ok(out)
    }
}

/// Convenience wrapper around [`Simulation::run`].
#[allow(clippy::too_many_arguments)]
pub fn run_simulation(
    mode: ExperimentMode,
    fast: &[Bar],
    slow: &[Bar],
    config: &SimulationConfig,
    risk: &RiskEngine,
    indicators: &dyn IndicatorModel,
    candidates: &dyn CandidateGenerator,
    provider: &dyn DecisionProvider,
) -> Result<SimulationOutput, SimulationError> {
    Simulation {
        mode,
        config,
        risk,
        indicators,
        candidates,
        provider,
    }
    .run(fast, slow)
}
