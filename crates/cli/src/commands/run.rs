//! `run` command: full pipeline over CSV price and post files.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Args;
use sentitrade_core::PipelineConfig;
use sentitrade_data::{CsvPostFeed, CsvPriceFeed};
use sentitrade_pipeline::{run_tickers, Pipeline, PipelineOutput, TickerRun};
use sentitrade_sentiment::Scorer;
use serde::Serialize;
use tokio::sync::watch;

use super::OutputFormat;

/// Arguments for the run command.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Tickers to process (e.g., "AAPL", "TSLA")
    #[arg(required = true)]
    pub tickers: Vec<String>,

    /// Price CSV, or a directory of <TICKER>.csv files
    #[arg(long)]
    pub prices: PathBuf,

    /// Post CSV, or a directory of <TICKER>.csv files
    #[arg(long)]
    pub posts: PathBuf,

    /// First day of the run (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last day of the run, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// One ticker in the JSON report.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum TickerReport<'a> {
    Ok(&'a PipelineOutput),
    Failed { ticker: &'a str, error: String },
}

impl<'a> From<&'a TickerRun> for TickerReport<'a> {
    fn from(run: &'a TickerRun) -> Self {
        match &run.result {
            Ok(output) => Self::Ok(output),
            Err(e) => Self::Failed {
                ticker: &run.ticker,
                error: e.to_string(),
            },
        }
    }
}

/// Runs the pipeline for every requested ticker and prints the results.
///
/// Ctrl+C cancels tickers still in flight.
///
/// # Errors
/// Returns an error if the scorer cannot be built, the configuration is
/// rejected, or any ticker fails.
pub async fn run_pipeline_command(args: RunArgs, config: PipelineConfig) -> Result<()> {
    let scorer = Arc::new(Scorer::from_config(&config.scorer).context("Failed to build scorer")?);
    tracing::info!(
        scorer = %scorer.primary_id(),
        tickers = args.tickers.len(),
        start = %args.start,
        end = %args.end,
        "Starting pipeline run"
    );

    let pipeline = Pipeline::new(
        Arc::new(CsvPriceFeed::new(&args.prices)),
        Arc::new(CsvPostFeed::new(&args.posts)),
        Arc::clone(&scorer),
        config,
    )?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, cancelling remaining tickers");
            let _ = shutdown_tx.send(true);
        }
    });

    let tickers: Vec<String> = args.tickers.iter().map(|t| t.to_uppercase()).collect();
    let runs = run_tickers(&pipeline, &tickers, args.start, args.end, shutdown_rx).await;

    ctrl_c.abort();
    scorer.shutdown().await;

    match args.format {
        OutputFormat::Text => print!("{}", render_text(&runs)),
        OutputFormat::Json => {
            let reports: Vec<TickerReport<'_>> = runs.iter().map(TickerReport::from).collect();
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    let failed = runs.iter().filter(|r| r.result.is_err()).count();
    if failed > 0 {
        bail!("{} of {} tickers failed", failed, runs.len());
    }
    Ok(())
}

fn render_text(runs: &[TickerRun]) -> String {
    let mut out = String::new();

    for run in runs {
        let _ = writeln!(out, "=== {} ===", run.ticker);
        match &run.result {
            Ok(output) => {
                let s = &output.summary;
                let _ = writeln!(
                    out,
                    "bars={} posts={} duplicates={} degraded={} fallbacks={} sentiment_days={} correlation_windows={}",
                    s.price_bars,
                    s.posts_scored,
                    s.duplicates,
                    s.degraded_posts,
                    s.scorer_fallbacks,
                    output.daily_sentiment.len(),
                    output.correlations.len(),
                );
                if output.signals.is_empty() {
                    let _ = writeln!(out, "no signals (not enough price history)");
                }
                for signal in &output.signals {
                    let _ = writeln!(
                        out,
                        "{}  {:<4}  {:+.4}  {}",
                        signal.date,
                        signal.action.to_string(),
                        signal.combined,
                        signal.rationale
                    );
                }
            }
            Err(e) => {
                let _ = writeln!(out, "FAILED: {e}");
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentitrade_core::{Action, PipelineError, ScoreComponents, Signal};
    use sentitrade_pipeline::RunSummary;

    fn output() -> PipelineOutput {
        PipelineOutput {
            ticker: "AAPL".into(),
            daily_sentiment: Vec::new(),
            correlations: Vec::new(),
            signals: vec![Signal {
                date: NaiveDate::from_ymd_opt(2024, 1, 22).unwrap(),
                ticker: "AAPL".into(),
                action: Action::Buy,
                score_components: ScoreComponents {
                    momentum: 1.0,
                    sentiment: None,
                },
                combined: 1.0,
                rationale: "momentum=+1".into(),
            }],
            summary: RunSummary::default(),
        }
    }

    #[test]
    fn text_report_lists_signals_and_failures() {
        let runs = vec![
            TickerRun {
                ticker: "AAPL".into(),
                result: Ok(output()),
            },
            TickerRun {
                ticker: "GONE".into(),
                result: Err(PipelineError::data_unavailable("GONE", "unknown ticker")),
            },
        ];

        let text = render_text(&runs);
        assert!(text.contains("=== AAPL ==="));
        assert!(text.contains("2024-01-22  BUY   +1.0000  momentum=+1"));
        assert!(text.contains("FAILED: data unavailable for GONE: unknown ticker"));
    }

    #[test]
    fn json_report_is_tagged_by_status() {
        let runs = vec![
            TickerRun {
                ticker: "AAPL".into(),
                result: Ok(output()),
            },
            TickerRun {
                ticker: "MSFT".into(),
                result: Err(PipelineError::cancelled("MSFT")),
            },
        ];
        let reports: Vec<TickerReport<'_>> = runs.iter().map(TickerReport::from).collect();
        let value = serde_json::to_value(&reports).unwrap();

        assert_eq!(value[0]["status"], "ok");
        assert_eq!(value[0]["ticker"], "AAPL");
        assert_eq!(value[0]["signals"][0]["action"], "BUY");
        assert_eq!(value[1]["status"], "failed");
        assert_eq!(value[1]["error"], "run cancelled for MSFT");
    }
}
