pub mod csv_feed;
pub mod memory;

pub use csv_feed::{engagement_reach, CsvPostFeed, CsvPriceFeed};
pub use memory::{InMemoryPostFeed, InMemoryPriceFeed};
