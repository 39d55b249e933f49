//! Trading decisions emitted by the signal generator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Discrete trading decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    /// Maps a combined score onto an action with a symmetric threshold.
    ///
    /// Scores exactly at `+threshold` or `-threshold` are a hold.
    #[must_use]
    pub fn from_score(combined: f64, threshold: f64) -> Self {
        if combined > threshold {
            Self::Buy
        } else if combined < -threshold {
            Self::Sell
        } else {
            Self::Hold
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}

/// Inputs to the decision rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    /// Crossover regime: -1 bearish, 0 no cross yet, +1 bullish
    pub momentum: f64,
    /// Confidence-scaled sentiment; `None` in momentum-only mode
    pub sentiment: Option<f64>,
}

/// One decision for one trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub date: NaiveDate,
    pub ticker: String,
    pub action: Action,
    pub score_components: ScoreComponents,
    /// Weighted combination compared against the threshold
    pub combined: f64,
    /// Numeric audit trail of the decision
    pub rationale: String,
}
