//! CSV-backed price and post feeds.
//!
//! A feed points at either a single file or a directory. With a directory,
//! each ticker lives in `<dir>/<TICKER>.csv`. With a single file, rows are
//! filtered on a `ticker` (or `symbol`) column when one exists; a file without
//! one is treated as belonging to whichever ticker is requested.
//!
//! Price files use `date,open,high,low,close,volume`. Headers are matched
//! case-insensitively, so `Date,Open,High,Low,Close,Adj Close,Volume` exports
//! load unchanged.
//!
//! Post files use `id,timestamp,ticker,text[,reach,author]`. The scraper layout
//! `date,username,content,url,retweetCount,likeCount` is also accepted, with
//! `url` as the id and reach derived from engagement. Text is decoded lossily;
//! invalid bytes become U+FFFD and are flagged downstream.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sentitrade_core::{Post, PostFeed, PipelineError, PriceBar, PriceFeed};
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ============================================
// Shared helpers
// ============================================

/// Resolves the file holding `ticker`'s rows.
fn resolve(path: &Path, ticker: &str) -> PathBuf {
    if path.is_dir() {
        path.join(format!("{ticker}.csv"))
    } else {
        path.to_path_buf()
    }
}

async fn read_file(path: &Path, ticker: &str) -> Result<Vec<u8>, PipelineError> {
    tokio::fs::read(path).await.map_err(|e| {
        PipelineError::data_unavailable(ticker, format!("cannot read {}: {e}", path.display()))
    })
}

/// Header positions, looked up case-insensitively by any of several names.
struct Columns {
    names: Vec<String>,
}

impl Columns {
    fn new(headers: &csv::ByteRecord) -> Self {
        Self {
            names: headers
                .iter()
                .map(|h| String::from_utf8_lossy(h).trim().to_lowercase())
                .collect(),
        }
    }

    fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases
            .iter()
            .find_map(|alias| self.names.iter().position(|n| n == alias))
    }

    fn require(&self, aliases: &[&str], ticker: &str) -> Result<usize, PipelineError> {
        self.find(aliases).ok_or_else(|| {
            PipelineError::data_unavailable(ticker, format!("missing column '{}'", aliases[0]))
        })
    }
}

fn field(record: &csv::ByteRecord, idx: usize) -> String {
    record
        .get(idx)
        .map(|b| String::from_utf8_lossy(b).trim().to_string())
        .unwrap_or_default()
}

fn optional_field(record: &csv::ByteRecord, idx: Option<usize>) -> Option<String> {
    idx.map(|i| field(record, i)).filter(|s| !s.is_empty())
}

fn row_matches_ticker(record: &csv::ByteRecord, ticker_col: Option<usize>, ticker: &str) -> bool {
    ticker_col.map_or(true, |i| field(record, i).eq_ignore_ascii_case(ticker))
}

/// Parses `YYYY-MM-DD`, ignoring any time or offset suffix.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Parses RFC 3339, `YYYY-MM-DD HH:MM:SS[+offset]`, or a bare date (midnight UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(ts.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

// ============================================
// Prices
// ============================================

/// [`PriceFeed`] reading daily bars from CSV.
#[derive(Debug, Clone)]
pub struct CsvPriceFeed {
    path: PathBuf,
}

impl CsvPriceFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parses every bar for `ticker` in `bytes`, sorted by date.
    ///
    /// # Errors
    /// [`PipelineError::DataUnavailable`] on missing columns or unparseable rows.
    pub fn parse(bytes: &[u8], ticker: &str) -> Result<Vec<PriceBar>, PipelineError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
        let headers = reader
            .byte_headers()
            .map_err(|e| PipelineError::data_unavailable(ticker, format!("bad CSV header: {e}")))?;
        let cols = Columns::new(headers);

        let date_col = cols.require(&["date", "timestamp"], ticker)?;
        let open_col = cols.require(&["open"], ticker)?;
        let high_col = cols.require(&["high"], ticker)?;
        let low_col = cols.require(&["low"], ticker)?;
        let close_col = cols.require(&["close"], ticker)?;
        let volume_col = cols.find(&["volume"]);
        let ticker_col = cols.find(&["ticker", "symbol"]);

        let mut bars = Vec::new();
        for (row, result) in reader.byte_records().enumerate() {
            let record = result.map_err(|e| {
                PipelineError::data_unavailable(ticker, format!("bad CSV row {}: {e}", row + 1))
            })?;
            if !row_matches_ticker(&record, ticker_col, ticker) {
                continue;
            }

            let bad_row = |what: &str| {
                PipelineError::data_unavailable(ticker, format!("row {}: invalid {what}", row + 1))
            };
            let price = |idx: usize, what: &str| {
                parse_decimal(&field(&record, idx)).ok_or_else(|| bad_row(what))
            };

            bars.push(PriceBar {
                date: parse_date(&field(&record, date_col)).ok_or_else(|| bad_row("date"))?,
                open: price(open_col, "open")?,
                high: price(high_col, "high")?,
                low: price(low_col, "low")?,
                close: price(close_col, "close")?,
                volume: volume_col
                    .and_then(|i| parse_decimal(&field(&record, i)))
                    .unwrap_or(Decimal::ZERO),
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

#[async_trait]
impl PriceFeed for CsvPriceFeed {
    async fn history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, PipelineError> {
        let path = resolve(&self.path, ticker);
        let bytes = read_file(&path, ticker).await?;

        let bars: Vec<PriceBar> = Self::parse(&bytes, ticker)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();

        if bars.is_empty() {
            return Err(PipelineError::data_unavailable(
                ticker,
                format!("no price bars between {start} and {end} in {}", path.display()),
            ));
        }

        tracing::debug!(ticker = %ticker, bars = bars.len(), path = %path.display(), "loaded prices");
        Ok(bars)
    }
}

// ============================================
// Posts
// ============================================

/// Reach derived from scraper engagement counts: `1 + ln(1 + likes + retweets)`.
#[must_use]
pub fn engagement_reach(likes: f64, retweets: f64) -> f64 {
    1.0 + (1.0 + likes.max(0.0) + retweets.max(0.0)).ln()
}

/// [`PostFeed`] reading posts from CSV.
#[derive(Debug, Clone)]
pub struct CsvPostFeed {
    path: PathBuf,
}

impl CsvPostFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parses every post for `ticker` in `bytes`, in file order.
    ///
    /// Rows without a usable timestamp are skipped. A missing id falls back
    /// to the row number.
    ///
    /// # Errors
    /// [`PipelineError::DataUnavailable`] on missing columns or malformed CSV.
    pub fn parse(bytes: &[u8], ticker: &str) -> Result<Vec<Post>, PipelineError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
        let headers = reader
            .byte_headers()
            .map_err(|e| PipelineError::data_unavailable(ticker, format!("bad CSV header: {e}")))?;
        let cols = Columns::new(headers);

        let ts_col = cols.require(&["timestamp", "date", "created_at"], ticker)?;
        let text_col = cols.require(&["text", "content", "body"], ticker)?;
        let id_col = cols.find(&["id", "url"]);
        let ticker_col = cols.find(&["ticker", "symbol"]);
        let reach_col = cols.find(&["reach"]);
        let author_col = cols.find(&["author", "username", "user"]);
        let likes_col = cols.find(&["likecount", "likes"]);
        let retweets_col = cols.find(&["retweetcount", "retweets"]);

        let mut posts = Vec::new();
        let mut skipped = 0usize;
        for (row, result) in reader.byte_records().enumerate() {
            let record = result.map_err(|e| {
                PipelineError::data_unavailable(ticker, format!("bad CSV row {}: {e}", row + 1))
            })?;
            if !row_matches_ticker(&record, ticker_col, ticker) {
                continue;
            }

            let Some(timestamp) = parse_timestamp(&field(&record, ts_col)) else {
                skipped += 1;
                continue;
            };

            let id = optional_field(&record, id_col).unwrap_or_else(|| format!("row-{}", row + 1));
            let reach = match optional_field(&record, reach_col).and_then(|r| r.parse::<f64>().ok()) {
                Some(reach) => Some(reach),
                None if likes_col.is_some() || retweets_col.is_some() => {
                    let count = |col| {
                        optional_field(&record, col)
                            .and_then(|v| v.parse::<f64>().ok())
                            .unwrap_or(0.0)
                    };
                    Some(engagement_reach(count(likes_col), count(retweets_col)))
                }
                None => None,
            };

            posts.push(Post {
                id,
                timestamp,
                ticker: ticker.to_string(),
                raw_text: field(&record, text_col),
                reach,
                author: optional_field(&record, author_col),
            });
        }

        if skipped > 0 {
            tracing::debug!(ticker = %ticker, skipped, "post rows without a usable timestamp skipped");
        }
        Ok(posts)
    }
}

#[async_trait]
impl PostFeed for CsvPostFeed {
    async fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        limit: usize,
    ) -> Result<Vec<Post>, PipelineError> {
        let path = resolve(&self.path, ticker);
        let bytes = read_file(&path, ticker).await?;

        let mut posts: Vec<Post> = Self::parse(&bytes, ticker)?
            .into_iter()
            .filter(|p| {
                let day = p.timestamp.date_naive();
                day >= start && day <= end
            })
            .collect();
        posts.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        posts.truncate(limit);

        tracing::debug!(ticker = %ticker, posts = posts.len(), path = %path.display(), "loaded posts");
        Ok(posts)
    }
}
