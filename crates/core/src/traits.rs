use crate::error::PipelineError;
use crate::post::Post;
use crate::price::PriceBar;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Source of daily price history.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Returns bars for `ticker` dated within `[start, end]`, ascending by date.
    ///
    /// # Errors
    /// [`PipelineError::DataUnavailable`] if the ticker is unknown or the range is empty.
    async fn history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, PipelineError>;
}

/// Source of raw posts.
#[async_trait]
pub trait PostFeed: Send + Sync {
    /// Returns up to `limit` posts for `ticker` published within `[start, end]`.
    ///
    /// Order is unspecified and duplicates are allowed.
    ///
    /// # Errors
    /// [`PipelineError::DataUnavailable`] if the feed cannot serve the request.
    async fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        limit: usize,
    ) -> Result<Vec<Post>, PipelineError>;
}
