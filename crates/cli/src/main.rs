use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::{ConfigArgs, RunArgs, ScoreArgs};

#[derive(Parser)]
#[command(name = "sentitrade")]
#[command(about = "Sentiment-driven trading signals from social posts and daily prices", long_about = None)]
struct Cli {
    /// Directory holding Config.toml, Config.<profile>.toml and Config.json
    #[arg(long, global = true, default_value = "config")]
    config_dir: PathBuf,

    /// Configuration profile layered over Config.toml (e.g., "backtest")
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline for one or more tickers over CSV feeds
    Run(RunArgs),
    /// Score a single piece of text with the configured strategy
    Score(ScoreArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = sentitrade_core::ConfigLoader::load_from(&cli.config_dir, cli.profile.as_deref())?;

    match cli.command {
        Commands::Run(args) => commands::run_pipeline_command(args, config).await?,
        Commands::Score(args) => commands::run_score(args, config).await?,
        Commands::Config(args) => commands::run_config(args, &config)?,
    }

    Ok(())
}
