//! Single-file scoring worker

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::analysis::HierarchyState;
use crate::records::{load_records_from_file, write_records_to_file, RunDescriptor};
use crate::scoring::{SampleScorer, ScoredRecord};

use super::executor::RunError;

/// Everything one worker produces for one result file
#[derive(Debug)]
pub struct FileOutcome {
    pub descriptor: RunDescriptor,
    pub records: Vec<ScoredRecord>,
    pub hierarchy: HierarchyState,
    pub read_time: Duration,
    pub score_time: Duration,
}

impl FileOutcome {
    pub fn sample_count(&self) -> usize {
        self.records.len()
    }
}

/// Load, score and aggregate one result file.
///
/// When `save_dir` is set the scored records are written there under the same
/// file name.
pub fn process_file(
    input_dir: &Path,
    descriptor: RunDescriptor,
    scorer: &SampleScorer,
    save_dir: Option<&PathBuf>,
) -> Result<FileOutcome, RunError> {
    let started = Instant::now();
    let records = load_records_from_file(input_dir.join(&descriptor.file_name))?;
    let read_time = started.elapsed();

    let started = Instant::now();
    let mut hierarchy = HierarchyState::new();
    let scored: Vec<ScoredRecord> = records
        .iter()
        .map(|record| {
            let scored = scorer.score(record, descriptor.mode);
            hierarchy.fold(&record.taxonomy(), scored.outcome, record.difficulty());
            scored
        })
        .collect();
    let score_time = started.elapsed();

    tracing::debug!(
        "{}: read {} records in {:.2}s, scored in {:.2}s",
        descriptor.file_name,
        records.len(),
        read_time.as_secs_f64(),
        score_time.as_secs_f64()
    );

    if let Some(dir) = save_dir {
        write_records_to_file(dir.join(&descriptor.file_name), &scored)?;
    }

    Ok(FileOutcome {
        descriptor,
        records: scored,
        hierarchy,
        read_time,
        score_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Mode;
    use crate::scoring::Outcome;

    fn write_input(dir: &Path, name: &str) {
        let lines = [
            r#"{"response":"The answer is A.","options":["x","y"],"answer_letter":"A","discipline":"Science","field":"Physics","subfield":"Optics","difficulty":"hard"}"#,
            r#"{"response":"no idea","options":["x","y"],"answer_letter":"B","discipline":"Science","field":"Physics","subfield":"Optics","difficulty":"easy"}"#,
            r#"{"response":"Answer: B","options":"broken","answer_letter":"B","discipline":"Science","field":"Chemistry","subfield":"Organic"}"#,
        ];
        std::fs::write(dir.join(name), lines.join("\n")).unwrap();
    }

    fn descriptor(name: &str) -> RunDescriptor {
        RunDescriptor::from_file_name(name, "dev", &Mode::all()).unwrap().unwrap()
    }

    #[test]
    fn test_process_file_scores_and_aggregates() {
        let dir = tempfile::tempdir().unwrap();
        write_input(dir.path(), "m_dev_zero-shot.jsonl");

        let outcome = process_file(dir.path(), descriptor("m_dev_zero-shot.jsonl"), &SampleScorer::default(), None).unwrap();

        assert_eq!(outcome.sample_count(), 3);
        let statuses: Vec<Outcome> = outcome.records.iter().map(|r| r.outcome).collect();
        assert_eq!(statuses, vec![Outcome::Correct, Outcome::Miss, Outcome::Error]);

        let science = &outcome.hierarchy.disciplines["Science"].counts;
        assert_eq!((science.total, science.correct, science.miss, science.error), (3, 1, 1, 1));
        assert_eq!(outcome.hierarchy.fields["Science/Physics"].counts.total, 2);
    }

    #[test]
    fn test_process_file_writes_scored_copy() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_input(input.path(), "m_dev_five-shot.jsonl");
        let save_dir = output.path().to_path_buf();

        process_file(input.path(), descriptor("m_dev_five-shot.jsonl"), &SampleScorer::default(), Some(&save_dir)).unwrap();

        let saved = crate::records::load_records_from_file(output.path().join("m_dev_five-shot.jsonl")).unwrap();
        assert_eq!(saved.len(), 3);
        assert_eq!(saved[0].fields()["status"], "correct");
        assert_eq!(saved[2].fields()["extracted_answer"], "error");
    }

    #[test]
    fn test_process_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = process_file(dir.path(), descriptor("m_dev_zero-shot.jsonl"), &SampleScorer::default(), None);
        assert!(matches!(result, Err(RunError::Load(_))));
    }
}
