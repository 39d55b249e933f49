pub mod correlation;
pub mod crossover;
pub mod signal_generator;

pub use correlation::{pearson_correlation, CorrelationEngine};
pub use crossover::{Cross, MaCrossover, MomentumReading};
pub use signal_generator::SignalGenerator;
