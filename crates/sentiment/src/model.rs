//! Model-based polarity scoring.
//!
//! The model strategy delegates classification to a [`ModelBackend`] and
//! calibrates the returned label distribution into a polarity. Two label
//! families are understood:
//!
//! - three-class sentiment: `positive` / `neutral` / `negative`
//!   (also `pos`/`neu`/`neg` and `LABEL_0..2`)
//! - star ratings: `1 star` .. `5 stars`, mapped to `(stars - 3) / 2`
//!
//! Polarity is the probability-weighted mean of the label values. Every call
//! is bounded by a timeout; any failure surfaces as [`ScorerUnavailable`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ScorerUnavailable;

/// One class and its probability, as returned by text-classification servers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// A loaded text classifier.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Model name recorded in `ScorerId::Model`.
    fn name(&self) -> &str;

    /// Classifies one text.
    ///
    /// # Errors
    /// Any transport or inference failure.
    async fn classify(&self, text: &str) -> anyhow::Result<Vec<LabelScore>>;

    /// Releases backend resources. Called once when the scorer shuts down.
    async fn shutdown(&self) {}
}

/// Maps a label onto the polarity scale, or `None` if it is not recognised.
fn label_value(label: &str) -> Option<f64> {
    let label = label.trim().to_lowercase();
    match label.as_str() {
        "positive" | "pos" | "label_2" => return Some(1.0),
        "neutral" | "neu" | "label_1" => return Some(0.0),
        "negative" | "neg" | "label_0" => return Some(-1.0),
        _ => {}
    }

    let stars = label
        .strip_suffix("stars")
        .or_else(|| label.strip_suffix("star"))?
        .trim()
        .parse::<u8>()
        .ok()?;
    (1..=5)
        .contains(&stars)
        .then(|| (f64::from(stars) - 3.0) / 2.0)
}

/// Calibrates a label distribution into a polarity in [-1, 1].
///
/// # Errors
/// [`ScorerUnavailable::UnrecognisedOutput`] if no label is recognised or the
/// recognised probabilities sum to zero.
pub fn calibrate(labels: &[LabelScore]) -> Result<f64, ScorerUnavailable> {
    let (weighted, total) = labels
        .iter()
        .filter(|l| l.score.is_finite() && l.score > 0.0)
        .filter_map(|l| label_value(&l.label).map(|v| (v * l.score, l.score)))
        .fold((0.0, 0.0), |(w, t), (vw, s)| (w + vw, t + s));

    if total <= 0.0 {
        let seen: Vec<&str> = labels.iter().map(|l| l.label.as_str()).collect();
        return Err(ScorerUnavailable::UnrecognisedOutput(format!(
            "labels {seen:?}"
        )));
    }
    Ok((weighted / total).clamp(-1.0, 1.0))
}

/// Model strategy: a shared backend handle plus a per-call timeout.
pub struct ModelScorer {
    backend: Arc<dyn ModelBackend>,
    timeout: Duration,
    loaded: AtomicBool,
}

impl std::fmt::Debug for ModelScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelScorer")
            .field("backend", &self.backend.name())
            .field("timeout", &self.timeout)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl ModelScorer {
    #[must_use]
    pub fn new(backend: Arc<dyn ModelBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            loaded: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.backend.name()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Scores text with the backend.
    ///
    /// # Errors
    /// [`ScorerUnavailable`] if the backend is shut down, times out, fails, or
    /// returns labels that cannot be calibrated.
    pub async fn polarity(&self, text: &str) -> Result<f64, ScorerUnavailable> {
        if !self.is_loaded() {
            return Err(ScorerUnavailable::NotLoaded(self.name().to_string()));
        }

        let labels = tokio::time::timeout(self.timeout, self.backend.classify(text))
            .await
            .map_err(|_| ScorerUnavailable::Timeout(self.timeout))?
            .map_err(|e| ScorerUnavailable::backend(format!("{e:#}")))?;

        calibrate(&labels)
    }

    /// Marks the scorer unloaded and tears the backend down. Idempotent.
    pub async fn shutdown(&self) {
        if self.loaded.swap(false, Ordering::AcqRel) {
            tracing::debug!(model = %self.name(), "shutting down model backend");
            self.backend.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct FixedBackend {
        labels: Vec<LabelScore>,
        shutdowns: AtomicUsize,
    }

    #[async_trait]
    impl ModelBackend for FixedBackend {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn classify(&self, _text: &str) -> anyhow::Result<Vec<LabelScore>> {
            Ok(self.labels.clone())
        }

        async fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct SlowBackend;

    #[async_trait]
    impl ModelBackend for SlowBackend {
        fn name(&self) -> &str {
            "slow"
        }

        async fn classify(&self, _text: &str) -> anyhow::Result<Vec<LabelScore>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![LabelScore::new("positive", 1.0)])
        }
    }

    fn fixed(labels: Vec<LabelScore>) -> Arc<FixedBackend> {
        Arc::new(FixedBackend {
            labels,
            shutdowns: AtomicUsize::new(0),
        })
    }

    // ============================================
    // Calibration
    // ============================================

    #[test]
    fn three_class_labels_use_expected_value() {
        let polarity = calibrate(&[
            LabelScore::new("positive", 0.7),
            LabelScore::new("neutral", 0.2),
            LabelScore::new("negative", 0.1),
        ])
        .unwrap();
        assert!((polarity - 0.6).abs() < 1e-9);
    }

    #[test]
    fn generic_label_ids_are_understood() {
        let polarity = calibrate(&[LabelScore::new("LABEL_0", 0.9), LabelScore::new("LABEL_2", 0.1)])
            .unwrap();
        assert!((polarity + 0.8).abs() < 1e-9);
    }

    #[test]
    fn star_ratings_map_to_polarity() {
        assert!((calibrate(&[LabelScore::new("5 stars", 1.0)]).unwrap() - 1.0).abs() < 1e-9);
        assert!((calibrate(&[LabelScore::new("1 star", 1.0)]).unwrap() + 1.0).abs() < 1e-9);
        assert!(calibrate(&[LabelScore::new("3 stars", 1.0)]).unwrap().abs() < 1e-9);

        // top-1 output only carries the winning label
        let polarity = calibrate(&[LabelScore::new("4 stars", 0.62)]).unwrap();
        assert!((polarity - 0.5).abs() < 1e-9);
    }

    #[test]
    fn unknown_labels_are_rejected() {
        let err = calibrate(&[LabelScore::new("joy", 0.9)]).unwrap_err();
        assert!(matches!(err, ScorerUnavailable::UnrecognisedOutput(_)));
        assert!(calibrate(&[]).is_err());
        assert!(calibrate(&[LabelScore::new("9 stars", 1.0)]).is_err());
    }

    // ============================================
    // ModelScorer
    // ============================================

    #[tokio::test]
    async fn scores_through_backend() {
        let scorer = ModelScorer::new(
            fixed(vec![LabelScore::new("positive", 1.0)]),
            Duration::from_secs(1),
        );
        assert_eq!(scorer.name(), "fixed");
        assert!((scorer.polarity("good").await.unwrap() - 1.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out() {
        let scorer = ModelScorer::new(Arc::new(SlowBackend), Duration::from_millis(100));
        let err = scorer.polarity("good").await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn shutdown_unloads_once() {
        let backend = fixed(vec![LabelScore::new("positive", 1.0)]);
        let scorer = ModelScorer::new(backend.clone(), Duration::from_secs(1));

        scorer.shutdown().await;
        scorer.shutdown().await;

        assert!(!scorer.is_loaded());
        assert_eq!(backend.shutdowns.load(Ordering::SeqCst), 1);
        let err = scorer.polarity("good").await.unwrap_err();
        assert_eq!(err, ScorerUnavailable::NotLoaded("fixed".into()));
    }
}
