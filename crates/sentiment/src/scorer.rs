//! Strategy selection and fallback.
//!
//! A [`Scorer`] is built once per process from configuration and shared by
//! handle. It normalizes each post, routes non-empty text to the configured
//! strategy, and falls back to the lexicon when the model is unavailable.
//! The fallback never surfaces as an error; callers learn about it through
//! [`ScoreOutcome::fallback`].

use anyhow::Result;
use sentitrade_core::{Post, ScoredPost, ScorerConfig, ScorerId, ScorerStrategy};
use std::sync::Arc;

use crate::error::ScorerUnavailable;
use crate::http_backend::HttpModelBackend;
use crate::lexicon::LexiconScorer;
use crate::model::ModelScorer;
use crate::normalizer::{Normalized, Normalizer};

/// The active scoring strategy.
#[derive(Debug)]
pub enum ScoringStrategy {
    Lexicon,
    Model(ModelScorer),
}

/// Result of scoring one post.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    pub scored: ScoredPost,
    /// Why the model strategy was bypassed, if it was
    pub fallback: Option<ScorerUnavailable>,
}

/// Normalizes and scores posts with the configured strategy.
#[derive(Debug)]
pub struct Scorer {
    normalizer: Normalizer,
    lexicon: LexiconScorer,
    strategy: ScoringStrategy,
}

impl Scorer {
    /// Creates a lexicon-only scorer.
    ///
    /// # Errors
    /// Returns an error if the normalizer patterns fail to compile.
    pub fn lexicon() -> Result<Self> {
        Self::with_strategy(ScoringStrategy::Lexicon)
    }

    /// Creates a scorer using `model`, with the lexicon as fallback.
    ///
    /// # Errors
    /// Returns an error if the normalizer patterns fail to compile.
    pub fn with_model(model: ModelScorer) -> Result<Self> {
        Self::with_strategy(ScoringStrategy::Model(model))
    }

    /// Builds the scorer described by `config`. The model strategy uses the
    /// bundled HTTP backend.
    ///
    /// # Errors
    /// Returns an error if the HTTP client or normalizer cannot be built.
    pub fn from_config(config: &ScorerConfig) -> Result<Self> {
        match config.strategy {
            ScorerStrategy::Lexicon => Self::lexicon(),
            ScorerStrategy::Model => {
                let backend = HttpModelBackend::new(&config.model)?;
                tracing::info!(
                    model = %config.model.name,
                    endpoint = %backend.endpoint(),
                    timeout_ms = config.model.timeout_ms,
                    "using model scorer"
                );
                Self::with_model(ModelScorer::new(Arc::new(backend), config.model.timeout()))
            }
        }
    }

    fn with_strategy(strategy: ScoringStrategy) -> Result<Self> {
        Ok(Self {
            normalizer: Normalizer::new()?,
            lexicon: LexiconScorer::new(),
            strategy,
        })
    }

    #[must_use]
    pub fn strategy(&self) -> &ScoringStrategy {
        &self.strategy
    }

    #[must_use]
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Identifier recorded on scores produced by the primary strategy.
    #[must_use]
    pub fn primary_id(&self) -> ScorerId {
        match &self.strategy {
            ScoringStrategy::Lexicon => ScorerId::Lexicon,
            ScoringStrategy::Model(model) => ScorerId::Model(model.name().to_string()),
        }
    }

    /// Scores free text. Returns the polarity and the strategy that produced it.
    pub async fn score_text(&self, text: &str) -> (f64, ScorerId) {
        let outcome = self.score_normalized(self.normalizer.normalize(text)).await;
        (outcome.0, outcome.1)
    }

    /// Scores one post. Empty posts get polarity 0.0 and `ScorerId::None`.
    pub async fn score_post(&self, post: Post) -> ScoreOutcome {
        let normalized = self.normalizer.normalize(&post.raw_text);
        let degraded = normalized.is_degraded();
        let empty = normalized.is_empty();
        let (polarity, scorer_id, fallback) = self.score_normalized(normalized).await;

        ScoreOutcome {
            scored: ScoredPost {
                post,
                polarity,
                scorer_id,
                degraded,
                empty,
            },
            fallback,
        }
    }

    async fn score_normalized(
        &self,
        normalized: Normalized,
    ) -> (f64, ScorerId, Option<ScorerUnavailable>) {
        let Normalized::Text(text) = normalized else {
            return (0.0, ScorerId::None, None);
        };

        match &self.strategy {
            ScoringStrategy::Lexicon => (self.lexicon.polarity(&text), ScorerId::Lexicon, None),
            ScoringStrategy::Model(model) => match model.polarity(&text.joined()).await {
                Ok(polarity) => (polarity, ScorerId::Model(model.name().to_string()), None),
                Err(e) => (self.lexicon.polarity(&text), ScorerId::Lexicon, Some(e)),
            },
        }
    }

    /// Tears down the model backend, if any. Later calls fall back to the lexicon.
    pub async fn shutdown(&self) {
        if let ScoringStrategy::Model(model) = &self.strategy {
            model.shutdown().await;
        }
    }
}
