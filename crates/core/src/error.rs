//! Error taxonomy for the sentiment-to-signal pipeline.
//!
//! Only [`PipelineError::DataUnavailable`] ends a ticker's run. The per-date and
//! per-window variants exist so stages can report what they skipped; they are
//! absorbed by the pipeline and never reach the caller.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors produced by pipeline stages and feeds.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Upstream feed has nothing usable for the requested range.
    #[error("data unavailable for {ticker}: {reason}")]
    DataUnavailable {
        /// Ticker whose run is halted.
        ticker: String,
        /// What the feed reported.
        reason: String,
    },

    /// Model scorer could not produce a score (not loaded, timed out, backend failure).
    #[error("scorer unavailable: {0}")]
    ScorerUnavailable(String),

    /// Not enough bars at or before a decision date to compute both moving averages.
    #[error("insufficient price history on {date}: have {available} bars, need {required}")]
    InsufficientPriceHistory {
        /// Decision date that was skipped.
        date: NaiveDate,
        /// Bars at or before the date.
        available: usize,
        /// `max(short_window, long_window)`.
        required: usize,
    },

    /// A correlation window had too few sentiment/return pairs.
    #[error("insufficient correlation data for window ending {window_end}: {pairs} pairs, need {required}")]
    InsufficientCorrelationData {
        /// Last return date of the window.
        window_end: NaiveDate,
        /// Best pair count across candidate lags.
        pairs: usize,
        /// Configured `min_pairs`.
        required: usize,
    },

    /// The ticker's run was cancelled before it finished; partial results were dropped.
    #[error("run cancelled for {ticker}")]
    Cancelled {
        /// Ticker whose work was rejected.
        ticker: String,
    },

    /// Configuration rejected before any work started.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    /// Creates a data unavailable error.
    pub fn data_unavailable(ticker: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            ticker: ticker.into(),
            reason: reason.into(),
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(ticker: impl Into<String>) -> Self {
        Self::Cancelled {
            ticker: ticker.into(),
        }
    }

    /// Returns true if the error ends the ticker's run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DataUnavailable { .. } | Self::Cancelled { .. } | Self::InvalidConfig(_)
        )
    }
}
