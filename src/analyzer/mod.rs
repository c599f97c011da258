pub mod metrics;
pub mod reaction;

pub use reaction::EarningsReactionAnalyzer;
