//! Analysis modules.
//!
//! Stressor categorization and the aggregation core behind the dashboard
//! and the tool outputs.

pub mod aggregator;
pub mod categorizer;

pub use aggregator::*;
