pub mod consistency;

pub use consistency::ConsistencyScorer;
