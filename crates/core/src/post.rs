//! Social-media posts and their scored form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw post referencing a ticker, as delivered by a [`PostFeed`](crate::PostFeed).
///
/// Posts are immutable once ingested; every later stage works on borrowed or
/// cloned copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Upstream identifier, used for deduplication
    pub id: String,
    /// Publication time
    pub timestamp: DateTime<Utc>,
    /// Ticker the post was collected for
    pub ticker: String,
    /// Unprocessed post body
    pub raw_text: String,
    /// Engagement weight for aggregation (defaults to 1 when absent)
    #[serde(default)]
    pub reach: Option<f64>,
    /// Author handle, if the feed provides one
    #[serde(default)]
    pub author: Option<String>,
}

impl Post {
    /// Creates a post with no reach or author information.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        timestamp: DateTime<Utc>,
        ticker: impl Into<String>,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            ticker: ticker.into(),
            raw_text: raw_text.into(),
            reach: None,
            author: None,
        }
    }

    /// Sets the engagement weight.
    #[must_use]
    pub fn with_reach(mut self, reach: f64) -> Self {
        self.reach = Some(reach);
        self
    }

    /// Aggregation weight of this post. Missing, non-finite or negative reach counts as 1.
    #[must_use]
    pub fn weight(&self) -> f64 {
        match self.reach {
            Some(r) if r.is_finite() && r >= 0.0 => r,
            _ => 1.0,
        }
    }
}

/// Identifies which scoring strategy produced a polarity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerId {
    /// Lexicon strategy (also used as the fallback)
    Lexicon,
    /// Model strategy, tagged with the backend name
    Model(String),
    /// Post was empty after normalization and never reached a scorer
    None,
}

impl std::fmt::Display for ScorerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexicon => write!(f, "lexicon"),
            Self::Model(name) => write!(f, "model:{name}"),
            Self::None => write!(f, "none"),
        }
    }
}

/// A post together with its polarity. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPost {
    pub post: Post,
    /// Polarity in [-1, 1]; 0.0 means neutral or unscorable
    pub polarity: f64,
    pub scorer_id: ScorerId,
    /// Text could not be fully normalized (encoding or control characters)
    pub degraded: bool,
    /// Nothing scorable remained after normalization
    pub empty: bool,
}

impl ScoredPost {
    /// Effective aggregation weight: reach, discounted for degraded posts, zero for empty ones.
    #[must_use]
    pub fn effective_weight(&self, degraded_weight: f64) -> f64 {
        if self.empty {
            return 0.0;
        }
        let base = self.post.weight();
        if self.degraded {
            base * degraded_weight
        } else {
            base
        }
    }
}
