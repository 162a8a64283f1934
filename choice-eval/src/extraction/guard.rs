//! Time-bounded pattern matching
//!
//! Matches run on a dedicated worker thread while the caller waits with a
//! deadline. A worker that misses the deadline is abandoned (it finishes its
//! current search in the background and then exits) and a fresh one is spawned
//! for the next match, so one pathological response cannot stall a batch.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use regex::Regex;

/// Default wall-clock budget for a single match
pub const DEFAULT_MATCH_BUDGET: Duration = Duration::from_secs(5);

/// Characters of the searched text included in diagnostics
const SAMPLE_CHARS: usize = 100;

type MatchJob = Box<dyn FnOnce() -> Option<String> + Send>;

struct MatchWorker {
    jobs: Sender<MatchJob>,
    replies: Receiver<Option<String>>,
}

impl MatchWorker {
    fn spawn() -> std::io::Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<MatchJob>();
        let (reply_tx, reply_rx) = mpsc::channel();

        thread::Builder::new()
            .name("guarded-matcher".to_string())
            .spawn(move || {
                for job in job_rx {
                    if reply_tx.send(job()).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            jobs: job_tx,
            replies: reply_rx,
        })
    }
}

/// Runs regex searches under a hard time budget
pub struct GuardedMatcher {
    budget: Duration,
    worker: Mutex<Option<MatchWorker>>,
}

impl GuardedMatcher {
    /// Create a matcher with the given per-match budget
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            worker: Mutex::new(None),
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Text of the first capture group of `pattern` in `text`.
    ///
    /// Returns `None` when there is no match, when the budget runs out, or
    /// when the search fails for any other reason.
    pub fn capture(&self, pattern: &Regex, text: &Arc<str>) -> Option<String> {
        let regex = pattern.clone();
        let haystack = Arc::clone(text);
        self.run(
            pattern.as_str(),
            text,
            Box::new(move || {
                regex
                    .captures(&haystack)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string())
            }),
        )
    }

    fn run(&self, pattern: &str, text: &str, job: MatchJob) -> Option<String> {
        let mut slot = self.worker.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if slot.is_none() {
            match MatchWorker::spawn() {
                Ok(worker) => *slot = Some(worker),
                Err(e) => {
                    tracing::warn!("Could not start match worker ({}), matching unguarded", e);
                    return job();
                }
            }
        }

        let outcome = match slot.as_ref() {
            Some(worker) => match worker.jobs.send(job) {
                Ok(()) => worker.replies.recv_timeout(self.budget),
                Err(_) => Err(RecvTimeoutError::Disconnected),
            },
            None => Err(RecvTimeoutError::Disconnected),
        };

        match outcome {
            Ok(found) => found,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    "Regex match timeout after {:?}: pattern={}, text={}",
                    self.budget,
                    pattern,
                    sample(text)
                );
                *slot = None;
                None
            }
            Err(RecvTimeoutError::Disconnected) => {
                tracing::warn!("Regex match error: worker lost, pattern={}, text={}", pattern, sample(text));
                *slot = None;
                None
            }
        }
    }
}

impl Default for GuardedMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_BUDGET)
    }
}

fn sample(text: &str) -> String {
    if text.chars().count() > SAMPLE_CHARS {
        text.chars().take(SAMPLE_CHARS).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
