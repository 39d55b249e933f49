//! `config` command: print the merged configuration.

use anyhow::Result;
use clap::Args;
use sentitrade_core::PipelineConfig;

/// Arguments for the config command.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Print a single section (scorer, aggregation, correlation, signal, ingest)
    #[arg(long)]
    pub section: Option<String>,
}

/// Prints the effective configuration as JSON.
///
/// # Errors
/// Returns an error if the section name is unknown.
pub fn run_config(args: ConfigArgs, config: &PipelineConfig) -> Result<()> {
    println!("{}", render(&args, config)?);
    Ok(())
}

fn render(args: &ConfigArgs, config: &PipelineConfig) -> Result<String> {
    let value = serde_json::to_value(config)?;
    let selected = match &args.section {
        Some(section) => value
            .get(section.as_str())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Unknown config section: {}", section))?,
        None => value,
    };
    Ok(serde_json::to_string_pretty(&selected)?)
}
