//! Derived daily series: aggregated sentiment and rolling correlation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Aggregated sentiment for one (ticker, calendar day).
///
/// Only days with at least one post exist; there is no zero-filled entry for a
/// day without posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySentiment {
    pub date: NaiveDate,
    pub ticker: String,
    /// Weighted mean polarity in [-1, 1]
    pub mean_polarity: f64,
    /// Posts on this day, degraded and empty ones included; always >= 1
    pub post_count: usize,
    /// Sample-size reliability in [0, 1]
    pub confidence: f64,
}

impl DailySentiment {
    /// Confidence-scaled polarity used by the signal generator.
    #[must_use]
    pub fn weighted_polarity(&self) -> f64 {
        self.mean_polarity * self.confidence
    }
}

/// Best-lag Pearson correlation between sentiment and returns for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// First return date in the window
    pub window_start: NaiveDate,
    /// Last return date in the window
    pub window_end: NaiveDate,
    /// Days sentiment leads the return
    pub lag: u32,
    /// Pearson coefficient in [-1, 1]
    pub coefficient: f64,
    /// Sentiment/return pairs behind the coefficient
    pub pair_count: usize,
}
