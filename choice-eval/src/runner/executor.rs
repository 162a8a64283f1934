//! Parallel executor that scores result files and merges their hierarchies

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::analysis::{HeadlineResults, HierarchyState};
use crate::extraction::{AnswerExtractor, DEFAULT_MATCH_BUDGET};
use crate::records::{LoadError, RunDescriptor};
use crate::scoring::SampleScorer;

use super::worker::{process_file, FileOutcome};

/// Error type for file processing
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Worker failed: {0}")]
    Worker(String),
}

/// Configuration for the executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Upper bound on concurrent file workers; 0 picks the available parallelism
    pub max_workers: usize,
    /// Wall-clock budget for a single pattern match
    pub match_budget: Duration,
    /// Where scored copies of the input files go, if anywhere
    pub save_dir: Option<PathBuf>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_workers: 0,
            match_budget: DEFAULT_MATCH_BUDGET,
            save_dir: None,
        }
    }
}

/// Headline figures of one processed file
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub descriptor: RunDescriptor,
    pub sample_count: usize,
    pub headline: HeadlineResults,
    pub read_time: Duration,
    pub score_time: Duration,
}

impl FileSummary {
    fn from_outcome(outcome: &FileOutcome) -> Self {
        Self {
            descriptor: outcome.descriptor.clone(),
            sample_count: outcome.sample_count(),
            headline: HeadlineResults::from_counts(&outcome.hierarchy.totals()),
            read_time: outcome.read_time,
            score_time: outcome.score_time,
        }
    }
}

/// A file that could not be processed
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub file_name: String,
    pub reason: String,
}

/// Merged result of a batch
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub hierarchy: HierarchyState,
    /// Processed files, sorted by file name
    pub files: Vec<FileSummary>,
    pub skipped: Vec<SkippedFile>,
}

impl BatchOutcome {
    pub fn sample_count(&self) -> usize {
        self.files.iter().map(|f| f.sample_count).sum()
    }
}

/// Running throughput across finished files, over read plus scoring time
#[derive(Debug, Default)]
struct Throughput {
    samples: usize,
    busy: Duration,
}

impl Throughput {
    fn add(&mut self, samples: usize, read_time: Duration, score_time: Duration) -> f64 {
        self.samples += samples;
        self.busy += read_time + score_time;
        let secs = self.busy.as_secs_f64();
        if secs > 0.0 {
            self.samples as f64 / secs
        } else {
            0.0
        }
    }
}

/// Executor for scoring a batch of result files
pub struct Executor {
    config: ExecutorConfig,
}

impl Executor {
    /// Create a new executor
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Number of concurrent workers for `file_count` files
    pub fn worker_count(&self, file_count: usize) -> usize {
        let available = if self.config.max_workers > 0 {
            self.config.max_workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        };
        available.min(file_count).max(1)
    }

    /// Score every file in `files` and merge the results.
    ///
    /// Each file runs on a blocking worker; results are merged as they finish.
    /// A failing file is logged and reported as skipped.
    pub async fn run(&self, input_dir: &Path, files: Vec<RunDescriptor>) -> BatchOutcome {
        let semaphore = Arc::new(Semaphore::new(self.worker_count(files.len())));
        let input_dir = Arc::new(input_dir.to_path_buf());
        let mut join_set = JoinSet::new();

        for descriptor in files {
            let semaphore = semaphore.clone();
            let input_dir = input_dir.clone();
            let save_dir = self.config.save_dir.clone();
            let budget = self.config.match_budget;
            let file_name = descriptor.file_name.clone();

            join_set.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(permit) => {
                        let handle = tokio::task::spawn_blocking(move || {
                            let scorer = SampleScorer::new(AnswerExtractor::with_budget(budget));
                            let outcome = process_file(&input_dir, descriptor, &scorer, save_dir.as_ref());
                            drop(permit);
                            outcome
                        });
                        match handle.await {
                            Ok(outcome) => outcome,
                            Err(e) => Err(RunError::Worker(e.to_string())),
                        }
                    }
                    Err(e) => Err(RunError::Worker(e.to_string())),
                };
                (file_name, result)
            });
        }

        let mut batch = BatchOutcome::default();
        let mut throughput = Throughput::default();

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((_, Ok(outcome))) => {
                    let rate = throughput.add(outcome.sample_count(), outcome.read_time, outcome.score_time);
                    tracing::info!(
                        "File {} completed - Samples: {} (avg {:.1} samples/sec)",
                        outcome.descriptor.file_name,
                        outcome.sample_count(),
                        rate
                    );
                    batch.hierarchy.absorb_run(
                        &outcome.descriptor.model,
                        outcome.descriptor.mode,
                        &outcome.hierarchy,
                    );
                    batch.files.push(FileSummary::from_outcome(&outcome));
                }
                Ok((file_name, Err(e))) => {
                    tracing::warn!("Skipping {}: {}", file_name, e);
                    batch.skipped.push(SkippedFile {
                        file_name,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::error!("File task panicked: {}", e);
                    batch.skipped.push(SkippedFile {
                        file_name: "<unknown>".to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        batch.files.sort_by(|a, b| a.descriptor.file_name.cmp(&b.descriptor.file_name));
        batch.skipped.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        batch
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}
