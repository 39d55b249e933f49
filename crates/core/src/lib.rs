pub mod config;
pub mod config_loader;
pub mod error;
pub mod post;
pub mod price;
pub mod series;
pub mod signal;
pub mod traits;

pub use config::{
    AggregationConfig, CorrelationConfig, DedupStrategy, IngestConfig, ModelConfig,
    PipelineConfig, ScorerConfig, ScorerStrategy, SignalConfig,
};
pub use config_loader::ConfigLoader;
pub use error::PipelineError;
pub use post::{Post, ScoredPost, ScorerId};
pub use price::{daily_returns, ensure_strictly_increasing, DailyReturn, PriceBar};
pub use series::{CorrelationResult, DailySentiment};
pub use signal::{Action, ScoreComponents, Signal};
pub use traits::{PostFeed, PriceFeed};
