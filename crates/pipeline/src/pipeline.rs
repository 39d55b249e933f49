//! Per-ticker pipeline: fetch, dedupe, score, aggregate, correlate, decide.

use std::sync::Arc;

use chrono::NaiveDate;
use futures_util::stream::{self, StreamExt};
use sentitrade_core::{
    daily_returns, ensure_strictly_increasing, CorrelationResult, DailySentiment, PipelineConfig,
    PipelineError, Post, PostFeed, PriceFeed, Signal,
};
use sentitrade_sentiment::{DailyAggregator, ScoreOutcome, Scorer};
use sentitrade_signals::{CorrelationEngine, SignalGenerator};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::dedup::deduplicate;

/// Everything a single ticker run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub ticker: String,
    pub daily_sentiment: Vec<DailySentiment>,
    pub correlations: Vec<CorrelationResult>,
    pub signals: Vec<Signal>,
    pub summary: RunSummary,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Bars returned by the price feed.
    pub price_bars: usize,
    /// Posts returned by the post feed.
    pub posts_fetched: usize,
    /// Posts dropped because they were outside the ticker or date range.
    pub posts_out_of_range: usize,
    /// Posts removed as duplicates.
    pub duplicates: usize,
    /// Posts that went through the scorer.
    pub posts_scored: usize,
    pub degraded_posts: usize,
    pub empty_posts: usize,
    /// Posts scored by the lexicon because the model was unavailable.
    pub scorer_fallbacks: usize,
}

/// Runs the full pipeline for one ticker at a time.
///
/// Cloning is cheap; feeds and the scorer are shared.
#[derive(Clone)]
pub struct Pipeline {
    prices: Arc<dyn PriceFeed>,
    posts: Arc<dyn PostFeed>,
    scorer: Arc<Scorer>,
    config: PipelineConfig,
    aggregator: DailyAggregator,
    correlation: CorrelationEngine,
    signals: SignalGenerator,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("scorer", &self.scorer.primary_id())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Builds a pipeline from feeds, a scorer and a configuration.
    ///
    /// # Errors
    /// [`PipelineError::InvalidConfig`] if the configuration fails validation.
    pub fn new(
        prices: Arc<dyn PriceFeed>,
        posts: Arc<dyn PostFeed>,
        scorer: Arc<Scorer>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            aggregator: DailyAggregator::new(&config.aggregation),
            correlation: CorrelationEngine::new(&config.correlation),
            signals: SignalGenerator::new(&config.signal),
            prices,
            posts,
            scorer,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn scorer(&self) -> &Arc<Scorer> {
        &self.scorer
    }

    /// Runs one ticker over `[start, end]`.
    ///
    /// Per-date and per-window shortfalls are logged and skipped. Model
    /// failures fall back to the lexicon and are only counted.
    ///
    /// # Errors
    /// [`PipelineError::DataUnavailable`] if either feed fails or the price
    /// series is not strictly increasing by date.
    pub async fn run(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PipelineOutput, PipelineError> {
        if start > end {
            return Err(PipelineError::data_unavailable(
                ticker,
                format!("empty range {start}..{end}"),
            ));
        }
        tracing::debug!(ticker = %ticker, %start, %end, "pipeline run started");

        let bars = self.prices.history(ticker, start, end).await?;
        ensure_strictly_increasing(ticker, &bars)?;

        // Feeds filter on UTC dates; one day of slack on each side covers any
        // offset, and the local-day filter below decides membership.
        let fetch_start = start.pred_opt().unwrap_or(start);
        let fetch_end = end.succ_opt().unwrap_or(end);
        let fetched = self
            .posts
            .fetch(ticker, fetch_start, fetch_end, self.config.ingest.post_limit)
            .await?;

        let mut summary = RunSummary {
            price_bars: bars.len(),
            posts_fetched: fetched.len(),
            ..RunSummary::default()
        };

        let in_range: Vec<_> = fetched
            .into_iter()
            .filter(|p| p.ticker.eq_ignore_ascii_case(ticker))
            .filter(|p| {
                let day = self.aggregator.day_of_timestamp(p.timestamp);
                day >= start && day <= end
            })
            .collect();
        summary.posts_out_of_range = summary.posts_fetched - in_range.len();

        let candidates = in_range.len();
        let unique = deduplicate(in_range, self.config.ingest.dedup);
        summary.duplicates = candidates - unique.len();

        let outcomes = self.score_all(unique).await;
        summary.posts_scored = outcomes.len();

        let mut scored = Vec::with_capacity(outcomes.len());
        let mut first_fallback = true;
        for outcome in outcomes {
            if let Some(e) = &outcome.fallback {
                summary.scorer_fallbacks += 1;
                if first_fallback {
                    tracing::warn!(
                        ticker = %ticker,
                        error = %e,
                        "model scorer unavailable, falling back to lexicon"
                    );
                    first_fallback = false;
                } else {
                    tracing::debug!(ticker = %ticker, error = %e, "lexicon fallback");
                }
            }
            summary.degraded_posts += usize::from(outcome.scored.degraded);
            summary.empty_posts += usize::from(outcome.scored.empty);
            scored.push(outcome.scored);
        }

        let daily_sentiment = self.aggregator.aggregate(&scored);
        let returns = daily_returns(&bars);
        let correlations = self.correlation.analyze(&daily_sentiment, &returns);
        let signals = self
            .signals
            .generate(ticker, &bars, &daily_sentiment, &correlations);

        tracing::info!(
            ticker = %ticker,
            bars = summary.price_bars,
            posts = summary.posts_scored,
            duplicates = summary.duplicates,
            degraded = summary.degraded_posts,
            fallbacks = summary.scorer_fallbacks,
            sentiment_days = daily_sentiment.len(),
            correlation_windows = correlations.len(),
            signals = signals.len(),
            "pipeline run complete"
        );

        Ok(PipelineOutput {
            ticker: ticker.to_string(),
            daily_sentiment,
            correlations,
            signals,
            summary,
        })
    }

    /// Like [`Pipeline::run`], but abandons the run once `shutdown` turns true.
    ///
    /// A dropped sender never cancels.
    ///
    /// # Errors
    /// [`PipelineError::Cancelled`] if shutdown was signalled first, otherwise
    /// whatever [`Pipeline::run`] returns.
    pub async fn run_until_shutdown(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<PipelineOutput, PipelineError> {
        let cancelled = async move {
            if shutdown.wait_for(|stop| *stop).await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            biased;
            () = cancelled => {
                tracing::info!(ticker = %ticker, "run cancelled, partial results discarded");
                Err(PipelineError::cancelled(ticker))
            }
            result = self.run(ticker, start, end) => result,
        }
    }

    /// Scores posts with bounded concurrency, preserving input order.
    async fn score_all(&self, posts: Vec<Post>) -> Vec<ScoreOutcome> {
        let scorer = &self.scorer;
        stream::iter(posts)
            .map(|post| scorer.score_post(post))
            .buffered(self.config.ingest.scoring_concurrency.max(1))
            .collect()
            .await
    }
}

/// One-shot convenience over [`Pipeline::new`] and [`Pipeline::run`].
///
/// # Errors
/// See [`Pipeline::new`] and [`Pipeline::run`].
pub async fn run_pipeline(
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
    config: PipelineConfig,
    prices: Arc<dyn PriceFeed>,
    posts: Arc<dyn PostFeed>,
    scorer: Arc<Scorer>,
) -> Result<PipelineOutput, PipelineError> {
    Pipeline::new(prices, posts, scorer, config)?
        .run(ticker, start, end)
        .await
}
