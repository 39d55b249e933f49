//! Sentiment stages of the pipeline: normalization, scoring and daily aggregation.

pub mod aggregator;
pub mod error;
pub mod http_backend;
pub mod lexicon;
pub mod model;
pub mod normalizer;
pub mod scorer;

pub use aggregator::DailyAggregator;
pub use error::ScorerUnavailable;
pub use http_backend::HttpModelBackend;
pub use lexicon::LexiconScorer;
pub use model::{calibrate, LabelScore, ModelBackend, ModelScorer};
pub use normalizer::{Normalized, NormalizedText, Normalizer};
pub use scorer::{ScoreOutcome, Scorer, ScoringStrategy};
