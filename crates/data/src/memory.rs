//! In-memory feeds for tests, replays and embedding callers.

use async_trait::async_trait;
use chrono::NaiveDate;
use sentitrade_core::{Post, PostFeed, PipelineError, PriceBar, PriceFeed};
use std::collections::HashMap;

/// [`PriceFeed`] over bars held in memory, keyed by ticker.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceFeed {
    bars: HashMap<String, Vec<PriceBar>>,
}

impl InMemoryPriceFeed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers bars for `ticker`. Bars are served in the order given.
    #[must_use]
    pub fn with_ticker(mut self, ticker: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        self.bars.insert(ticker.into(), bars);
        self
    }
}

#[async_trait]
impl PriceFeed for InMemoryPriceFeed {
    async fn history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, PipelineError> {
        let bars = self
            .bars
            .get(ticker)
            .ok_or_else(|| PipelineError::data_unavailable(ticker, "unknown ticker"))?;

        let in_range: Vec<PriceBar> = bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();

        if in_range.is_empty() {
            return Err(PipelineError::data_unavailable(
                ticker,
                format!("no price bars between {start} and {end}"),
            ));
        }
        Ok(in_range)
    }
}

/// [`PostFeed`] over a fixed list of posts.
///
/// Posts are served in insertion order, duplicates included, which makes it
/// useful for exercising deduplication.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPostFeed {
    posts: Vec<Post>,
    unavailable: Option<String>,
}

impl InMemoryPostFeed {
    #[must_use]
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts,
            unavailable: None,
        }
    }

    /// Makes every fetch fail with `DataUnavailable`.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            posts: Vec::new(),
            unavailable: Some(reason.into()),
        }
    }
}

#[async_trait]
impl PostFeed for InMemoryPostFeed {
    async fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        limit: usize,
    ) -> Result<Vec<Post>, PipelineError> {
        if let Some(reason) = &self.unavailable {
            return Err(PipelineError::data_unavailable(ticker, reason.clone()));
        }

        Ok(self
            .posts
            .iter()
            .filter(|p| p.ticker == ticker)
            .filter(|p| {
                let day = p.timestamp.date_naive();
                day >= start && day <= end
            })
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[tokio::test]
    async fn price_feed_filters_range_and_rejects_unknown() {
        let feed = InMemoryPriceFeed::new().with_ticker(
            "AAPL",
            vec![
                PriceBar::flat(date(3), dec!(10)),
                PriceBar::flat(date(4), dec!(11)),
                PriceBar::flat(date(5), dec!(12)),
            ],
        );

        let bars = feed.history("AAPL", date(4), date(30)).await.unwrap();
        assert_eq!(bars.len(), 2);

        assert!(feed.history("AAPL", date(10), date(20)).await.is_err());
        let err = feed.history("GME", date(1), date(30)).await.unwrap_err();
        assert_eq!(err, PipelineError::data_unavailable("GME", "unknown ticker"));
    }

    #[tokio::test]
    async fn post_feed_filters_and_limits() {
        let at = |d: u32| Utc.with_ymd_and_hms(2024, 6, d, 12, 0, 0).unwrap();
        let feed = InMemoryPostFeed::new(vec![
            Post::new("1", at(3), "AAPL", "a"),
            Post::new("1", at(3), "AAPL", "a"),
            Post::new("2", at(4), "MSFT", "b"),
            Post::new("3", at(9), "AAPL", "c"),
        ]);

        let posts = feed.fetch("AAPL", date(1), date(5), 10).await.unwrap();
        assert_eq!(posts.len(), 2);

        let posts = feed.fetch("AAPL", date(1), date(30), 1).await.unwrap();
        assert_eq!(posts.len(), 1);
    }

    #[tokio::test]
    async fn unavailable_post_feed_fails() {
        let feed = InMemoryPostFeed::unavailable("rate limited");
        let err = feed.fetch("AAPL", date(1), date(2), 10).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
