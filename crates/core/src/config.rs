use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::PipelineError;

/// Complete pipeline configuration. Every field has a default, so an empty
/// config file is valid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub scorer: ScorerConfig,
    pub aggregation: AggregationConfig,
    pub correlation: CorrelationConfig,
    pub signal: SignalConfig,
    pub ingest: IngestConfig,
}

/// Which scoring strategy runs for the whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorerStrategy {
    #[default]
    Lexicon,
    Model,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    pub strategy: ScorerStrategy,
    pub model: ModelConfig,
}

/// Connection settings for the model strategy's inference server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Text-classification endpoint accepting `{"inputs": "..."}`
    pub endpoint: String,
    /// Name recorded in `ScorerId::Model`
    pub name: String,
    /// Per-post inference budget; exceeding it triggers the lexicon fallback
    pub timeout_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080/classify".to_string(),
            name: "bert-base-multilingual-uncased-sentiment".to_string(),
            timeout_ms: 2_000,
        }
    }
}

impl ModelConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// IANA timezone that defines a calendar day
    pub timezone: Tz,
    /// Post count at which confidence reaches 1.0
    pub confidence_saturation_count: u32,
    /// Weight multiplier for degraded posts
    pub degraded_weight: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            confidence_saturation_count: 20,
            degraded_weight: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Rolling window length in trading days
    pub window: usize,
    /// Largest lag tried, in calendar days
    pub max_lag: u32,
    /// Minimum pairs for a coefficient to be reported
    pub min_pairs: usize,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            window: 14,
            max_lag: 3,
            min_pairs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub short_window: usize,
    pub long_window: usize,
    pub momentum_weight: f64,
    pub sentiment_weight: f64,
    pub threshold: f64,
    /// Oldest sentiment (in days before the decision date) still considered current
    pub staleness_window_days: i64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            short_window: 5,
            long_window: 20,
            momentum_weight: 0.6,
            sentiment_weight: 0.4,
            threshold: 0.3,
            staleness_window_days: 5,
        }
    }
}

impl SignalConfig {
    /// Bars needed at or before a decision date.
    #[must_use]
    pub fn required_history(&self) -> usize {
        self.short_window.max(self.long_window)
    }
}

/// How duplicate posts are recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupStrategy {
    /// Same `Post::id`
    #[default]
    Id,
    /// Same ticker, timestamp and text, for feeds with unstable ids
    Content,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum posts requested from the post feed per ticker
    pub post_limit: usize,
    pub dedup: DedupStrategy,
    /// Posts scored concurrently within one ticker
    pub scoring_concurrency: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            post_limit: 1000,
            dedup: DedupStrategy::Id,
            scoring_concurrency: 8,
        }
    }
}

impl PipelineConfig {
    /// Rejects configurations the pipeline cannot run with.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |msg: String| Err(PipelineError::InvalidConfig(msg));

        let agg = &self.aggregation;
        if agg.confidence_saturation_count == 0 {
            return invalid("aggregation.confidence_saturation_count must be positive".into());
        }
        if !(0.0..=1.0).contains(&agg.degraded_weight) {
            return invalid(format!(
                "aggregation.degraded_weight must be in [0, 1], got {}",
                agg.degraded_weight
            ));
        }

        let corr = &self.correlation;
        if corr.min_pairs < 3 {
            return invalid(format!(
                "correlation.min_pairs must be at least 3, got {}",
                corr.min_pairs
            ));
        }
        if corr.window < corr.min_pairs {
            return invalid(format!(
                "correlation.window ({}) must be >= min_pairs ({})",
                corr.window, corr.min_pairs
            ));
        }

        let sig = &self.signal;
        if sig.short_window == 0 || sig.long_window == 0 {
            return invalid("signal windows must be positive".into());
        }
        if sig.short_window >= sig.long_window {
            return invalid(format!(
                "signal.short_window ({}) must be shorter than long_window ({})",
                sig.short_window, sig.long_window
            ));
        }
        if sig.momentum_weight < 0.0 || sig.sentiment_weight < 0.0 {
            return invalid("signal weights must be non-negative".into());
        }
        if sig.momentum_weight + sig.sentiment_weight <= 0.0 {
            return invalid("signal weights must not both be zero".into());
        }
        if !(0.0..=1.0).contains(&sig.threshold) {
            return invalid(format!(
                "signal.threshold must be in [0, 1], got {}",
                sig.threshold
            ));
        }
        if sig.staleness_window_days < 0 {
            return invalid("signal.staleness_window_days must be non-negative".into());
        }

        if self.ingest.scoring_concurrency == 0 {
            return invalid("ingest.scoring_concurrency must be positive".into());
        }
        if self.scorer.strategy == ScorerStrategy::Model && self.scorer.model.timeout_ms == 0 {
            return invalid("scorer.model.timeout_ms must be positive".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.scorer.strategy, ScorerStrategy::Lexicon);
        assert_eq!(config.aggregation.timezone, Tz::UTC);
        assert_eq!(config.aggregation.confidence_saturation_count, 20);
        assert!((config.aggregation.degraded_weight - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.correlation.window, 14);
        assert_eq!(config.correlation.max_lag, 3);
        assert_eq!(config.correlation.min_pairs, 5);
        assert_eq!(config.signal.short_window, 5);
        assert_eq!(config.signal.long_window, 20);
        assert!((config.signal.momentum_weight - 0.6).abs() < f64::EPSILON);
        assert!((config.signal.sentiment_weight - 0.4).abs() < f64::EPSILON);
        assert!((config.signal.threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.signal.staleness_window_days, 5);
        assert_eq!(config.ingest.dedup, DedupStrategy::Id);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn required_history_is_longest_window() {
        let config = SignalConfig::default();
        assert_eq!(config.required_history(), 20);
    }

    #[test]
    fn validate_rejects_inverted_windows() {
        let mut config = PipelineConfig::default();
        config.signal.short_window = 30;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("short_window"));
    }

    #[test]
    fn validate_rejects_window_smaller_than_min_pairs() {
        let mut config = PipelineConfig::default();
        config.correlation.window = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_weights() {
        let mut config = PipelineConfig::default();
        config.aggregation.degraded_weight = 1.5;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.signal.momentum_weight = 0.0;
        config.signal.sentiment_weight = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{"aggregation": {"timezone": "America/New_York"}, "scorer": {"strategy": "model"}}"#,
        )
        .unwrap();
        assert_eq!(config.aggregation.timezone, chrono_tz::America::New_York);
        assert_eq!(config.aggregation.confidence_saturation_count, 20);
        assert_eq!(config.scorer.strategy, ScorerStrategy::Model);
        assert_eq!(config.scorer.model.timeout_ms, 2_000);
    }
}
