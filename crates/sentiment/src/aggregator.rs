//! Daily aggregation of scored posts.
//!
//! Posts are bucketed by ticker and by calendar day in the configured
//! timezone. Each bucket becomes one [`DailySentiment`] holding the
//! reach-weighted mean polarity and a confidence that grows with the number
//! of posts until it saturates at 1.0.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use sentitrade_core::{AggregationConfig, DailySentiment, ScoredPost};
use std::collections::BTreeMap;

/// Groups scored posts into per-day sentiment.
#[derive(Debug, Clone)]
pub struct DailyAggregator {
    timezone: Tz,
    saturation_count: u32,
    degraded_weight: f64,
}

impl DailyAggregator {
    #[must_use]
    pub fn new(config: &AggregationConfig) -> Self {
        Self {
            timezone: config.timezone,
            saturation_count: config.confidence_saturation_count.max(1),
            degraded_weight: config.degraded_weight,
        }
    }

    /// Calendar day a post belongs to.
    #[must_use]
    pub fn day_of(&self, post: &ScoredPost) -> NaiveDate {
        self.day_of_timestamp(post.post.timestamp)
    }

    /// Calendar day of a UTC instant in the aggregation timezone.
    #[must_use]
    pub fn day_of_timestamp(&self, timestamp: DateTime<Utc>) -> NaiveDate {
        timestamp.with_timezone(&self.timezone).date_naive()
    }

    /// Confidence for a day with `post_count` posts.
    #[must_use]
    pub fn confidence(&self, post_count: usize) -> f64 {
        (post_count as f64 / f64::from(self.saturation_count)).min(1.0)
    }

    /// Aggregates posts into one entry per (ticker, day) that has posts.
    ///
    /// Output is sorted by ticker, then date. Degraded and empty posts count
    /// toward `post_count`; empty posts carry no weight, and a day whose
    /// total weight is zero has a mean of 0.0. The result does not depend on
    /// input order.
    #[must_use]
    pub fn aggregate(&self, posts: &[ScoredPost]) -> Vec<DailySentiment> {
        let mut buckets: BTreeMap<(&str, NaiveDate), Vec<&ScoredPost>> = BTreeMap::new();
        for post in posts {
            buckets
                .entry((post.post.ticker.as_str(), self.day_of(post)))
                .or_default()
                .push(post);
        }

        buckets
            .into_iter()
            .map(|((ticker, date), mut day_posts)| {
                // Fixed summation order keeps the float result order-invariant
                day_posts.sort_by(|a, b| {
                    a.post
                        .id
                        .cmp(&b.post.id)
                        .then_with(|| a.post.timestamp.cmp(&b.post.timestamp))
                        .then_with(|| a.post.raw_text.cmp(&b.post.raw_text))
                        .then_with(|| a.polarity.total_cmp(&b.polarity))
                });

                let (weighted, total_weight) =
                    day_posts.iter().fold((0.0, 0.0), |(sum, total), p| {
                        let w = p.effective_weight(self.degraded_weight);
                        (sum + w * p.polarity, total + w)
                    });

                let mean_polarity = if total_weight > 0.0 {
                    (weighted / total_weight).clamp(-1.0, 1.0)
                } else {
                    0.0
                };

                DailySentiment {
                    date,
                    ticker: ticker.to_string(),
                    mean_polarity,
                    post_count: day_posts.len(),
                    confidence: self.confidence(day_posts.len()),
                }
            })
            .collect()
    }
}
