//! Analysis modules.
//!
//! Area aggregation and proximity alerting. Both are pure functions of
//! their inputs.

pub mod aggregator;
pub mod proximity;

pub use aggregator::*;
pub use proximity::*;
