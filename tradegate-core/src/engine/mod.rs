//! Simulation engine: one bar loop per experiment mode.
//!
//! The engine consumes two strictly ascending bar series (fast entry bars,
//! slow trend bars) and a set of pluggable components, then produces trades,
//! an equity curve, a decision log and warnings.

pub mod simulation;
pub mod state;

pub use simulation::{run_simulation, ResolvedDecision, Simulation};
pub use state::{RunWarning, SimulationError, SimulationOutput, SimulationState};
