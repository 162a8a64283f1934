//! Batch execution engine

pub mod executor;
pub mod worker;

pub use executor::{BatchOutcome, Executor, ExecutorConfig, FileSummary, RunError, SkippedFile};
pub use worker::{process_file, FileOutcome};
