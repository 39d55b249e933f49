//! `score` command: polarity of a single text.

use anyhow::{Context, Result};
use clap::Args;
use sentitrade_core::PipelineConfig;
use sentitrade_sentiment::{Normalized, Scorer};
use serde_json::json;
use tokio::io::AsyncReadExt;

use super::OutputFormat;

/// Arguments for the score command.
#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    /// Text to score. Reads stdin when omitted.
    pub text: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Scores one text with the configured strategy and prints the polarity.
///
/// # Errors
/// Returns an error if the scorer cannot be built or stdin cannot be read.
pub async fn run_score(args: ScoreArgs, config: PipelineConfig) -> Result<()> {
    let text = match args.text {
        Some(text) => text,
        None => {
            let mut bytes = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut bytes)
                .await
                .context("Failed to read text from stdin")?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
    };

    let scorer = Scorer::from_config(&config.scorer).context("Failed to build scorer")?;
    let normalized = scorer.normalizer().normalize(&text);
    let (polarity, scorer_id) = scorer.score_text(&text).await;
    scorer.shutdown().await;

    let tokens = match &normalized {
        Normalized::Text(t) => t.tokens.clone(),
        Normalized::Empty { .. } => Vec::new(),
    };

    match args.format {
        OutputFormat::Text => {
            println!("polarity: {polarity:+.4}");
            println!("scorer:   {scorer_id}");
            println!("tokens:   {}", tokens.join(" "));
            if normalized.is_degraded() {
                println!("note:     input had encoding damage");
            }
        }
        OutputFormat::Json => {
            let report = json!({
                "polarity": polarity,
                "scorer": scorer_id,
                "tokens": tokens,
                "degraded": normalized.is_degraded(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
