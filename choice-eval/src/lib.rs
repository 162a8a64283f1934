//! Multiple-choice answer extraction and hierarchical accuracy statistics
//!
//! This crate scores already-collected LLM responses to multiple-choice
//! benchmark questions and aggregates the outcomes across a
//! discipline → field → subfield taxonomy and three difficulty tiers.
//!
//! # Features
//!
//! - Answer extraction from free text, with a per-match time budget
//! - Correct / incorrect / miss / error classification per sample
//! - Mergeable three-level statistics with per-model, per-mode snapshots
//! - Sample-wise and category-wise overall projections
//! - Per-metric report tables, JSON summaries and scored record files
//!
//! # Example
//!
//! ```no_run
//! use choice_eval::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let selection = FileSelection {
//!         evaluate_all: true,
//!         models: Vec::new(),
//!         split: "SuperGPQA-all".to_string(),
//!         modes: Mode::all(),
//!     };
//!
//!     let files: Vec<RunDescriptor> = discover_files("results/gpqa", &selection)?
//!         .iter()
//!         .filter_map(|name| RunDescriptor::from_file_name(name, &selection.split, &selection.modes).ok().flatten())
//!         .collect();
//!
//!     let batch = Executor::default().run(std::path::Path::new("results/gpqa"), files).await;
//!     print_console_report(&batch.files);
//!
//!     let sheets = build_sheets(&batch.hierarchy);
//!     write_sheets("results_with_status/report", &sheets)?;
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod extraction;
pub mod records;
pub mod reporting;
pub mod runner;
pub mod scoring;

pub use config::EvalConfig;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::analysis::{
        overall, Counts, HeadlineResults, HierarchyState, Metric, OverallPolicy, View,
    };
    pub use crate::config::EvalConfig;
    pub use crate::extraction::{AnswerExtractor, ExtractionResult, GuardedMatcher};
    pub use crate::records::{
        discover_files, load_records_from_file, Difficulty, EvaluationRecord, FileSelection, Level,
        Mode, RunDescriptor, Taxonomy,
    };
    pub use crate::reporting::{
        build_sheets, print_console_report, write_sheets, JsonSummary, MetricSheet,
    };
    pub use crate::runner::{BatchOutcome, Executor, ExecutorConfig};
    pub use crate::scoring::{Outcome, SampleScorer, ScoredRecord};
}
