use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Experiment mode: how the AI gate participates in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentMode {
    /// Rules only; the provider is never consulted.
    Baseline,
    /// DENY skips the entry; sizing ignores confidence.
    AiFilter,
    /// DENY skips the entry; risk budget scales with confidence.
    AiFilterSizing,
}

impl ExperimentMode {
    pub const ALL: [ExperimentMode; 3] = [
        ExperimentMode::Baseline,
        ExperimentMode::AiFilter,
        ExperimentMode::AiFilterSizing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperimentMode::Baseline => "baseline",
            ExperimentMode::AiFilter => "ai_filter",
            ExperimentMode::AiFilterSizing => "ai_filter_sizing",
        }
    }

    pub fn consults_ai(&self) -> bool {
        !matches!(self, ExperimentMode::Baseline)
    }

    pub fn scales_by_confidence(&self) -> bool {
        matches!(self, ExperimentMode::AiFilterSizing)
    }
}

impl fmt::Display for ExperimentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperimentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "baseline" => Ok(ExperimentMode::Baseline),
            "ai_filter" => Ok(ExperimentMode::AiFilter),
            "ai_filter_sizing" => Ok(ExperimentMode::AiFilterSizing),
            other => Err(format!("unknown experiment mode: {other}")),
        }
    }
}
