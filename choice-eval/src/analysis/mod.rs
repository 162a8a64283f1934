//! Outcome aggregation and summary projections

pub mod hierarchy;
pub mod metrics;

pub use hierarchy::{CategoryStats, Counts, DifficultyBreakdown, HierarchyState, TierStats};
pub use metrics::{overall, participants, rate, HeadlineResults, Metric, OverallPolicy, View};
