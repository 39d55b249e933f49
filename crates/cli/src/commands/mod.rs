//! CLI commands for the sentiment-to-signal pipeline.

pub mod config;
pub mod run;
pub mod score;

pub use config::{run_config, ConfigArgs};
pub use run::{run_pipeline_command, RunArgs};
pub use score::{run_score, ScoreArgs};

/// Output format shared by commands that print results.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Text,
    /// Pretty-printed JSON on stdout
    Json,
}
