//! Sentiment-to-signal pipeline.
//!
//! Wires the feeds, the scorer, the daily aggregator, the correlation engine
//! and the signal generator into one run per ticker.

pub mod dedup;
pub mod pipeline;
pub mod runner;

pub use dedup::deduplicate;
pub use pipeline::{run_pipeline, Pipeline, PipelineOutput, RunSummary};
pub use runner::{run_tickers, TickerRun};
