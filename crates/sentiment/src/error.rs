//! Errors raised by the model scoring strategy.
//!
//! Every variant is recoverable: the [`Scorer`](crate::Scorer) falls back to
//! the lexicon strategy and never lets these reach the pipeline.

use sentitrade_core::PipelineError;
use std::time::Duration;
use thiserror::Error;

/// Reasons the model strategy could not produce a polarity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScorerUnavailable {
    /// Backend was never loaded or has been shut down.
    #[error("model {0} is not loaded")]
    NotLoaded(String),

    /// Inference exceeded the configured budget.
    #[error("model inference timed out after {0:?}")]
    Timeout(Duration),

    /// Backend reported a failure.
    #[error("model backend error: {0}")]
    Backend(String),

    /// Backend answered with labels that cannot be mapped to a polarity.
    #[error("unrecognised model output: {0}")]
    UnrecognisedOutput(String),
}

impl ScorerUnavailable {
    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Returns true if the failure was a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<ScorerUnavailable> for PipelineError {
    fn from(err: ScorerUnavailable) -> Self {
        Self::ScorerUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_pipeline_error() {
        let err: PipelineError = ScorerUnavailable::Timeout(Duration::from_millis(250)).into();
        assert_eq!(
            err,
            PipelineError::ScorerUnavailable("model inference timed out after 250ms".into())
        );
        assert!(!err.is_fatal());
    }

    #[test]
    fn timeout_predicate() {
        assert!(ScorerUnavailable::Timeout(Duration::from_secs(1)).is_timeout());
        assert!(!ScorerUnavailable::backend("502").is_timeout());
    }
}
