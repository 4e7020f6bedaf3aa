//! Score aggregation and issue collation.

pub mod aggregator;
pub mod collator;

pub use aggregator::*;
pub use collator::*;
