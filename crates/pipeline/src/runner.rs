//! Multi-ticker fan-out.
//!
//! Each ticker runs in its own task and can be cancelled through a shared
//! `watch` channel. Tickers never share intermediate state, so a failure or
//! cancellation in one leaves the others untouched.

use chrono::NaiveDate;
use futures_util::future::join_all;
use sentitrade_core::PipelineError;
use tokio::sync::watch;

use crate::pipeline::{Pipeline, PipelineOutput};

/// Result of one ticker in a fan-out run.
#[derive(Debug)]
pub struct TickerRun {
    pub ticker: String,
    pub result: Result<PipelineOutput, PipelineError>,
}

/// Runs every ticker concurrently and returns results in input order.
///
/// Setting `shutdown` to `true` cancels tickers still in flight; they report
/// [`PipelineError::Cancelled`].
pub async fn run_tickers(
    pipeline: &Pipeline,
    tickers: &[String],
    start: NaiveDate,
    end: NaiveDate,
    shutdown: watch::Receiver<bool>,
) -> Vec<TickerRun> {
    let handles: Vec<_> = tickers
        .iter()
        .map(|ticker| {
            let pipeline = pipeline.clone();
            let ticker = ticker.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                pipeline
                    .run_until_shutdown(&ticker, start, end, shutdown)
                    .await
            })
        })
        .collect();

    let joined = join_all(handles).await;

    tickers
        .iter()
        .zip(joined)
        .map(|(ticker, joined)| {
            let result = match joined {
                Ok(result) => result,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => {
                    tracing::warn!(ticker = %ticker, error = %e, "ticker task aborted");
                    Err(PipelineError::cancelled(ticker.as_str()))
                }
            };
            if let Err(e) = &result {
                tracing::warn!(ticker = %ticker, error = %e, "ticker run failed");
            }
            TickerRun {
                ticker: ticker.clone(),
                result,
            }
        })
        .collect()
}
