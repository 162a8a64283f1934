//! Results reporting

pub mod table;

pub use table::{build_sheet, build_sheets, format_percent, write_sheets, MetricSheet, ReportRow, RowKind};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::analysis::{Counts, HeadlineResults, HierarchyState};
use crate::records::Mode;
use crate::runner::FileSummary;

/// Summary of one (model, mode) run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub accuracy: f64,
    pub errors: f64,
    pub miss: f64,
    pub accuracy_hard: f64,
    pub accuracy_middle: f64,
    pub accuracy_easy: f64,
    /// Raw counts per subfield key
    pub categories: BTreeMap<String, Counts>,
}

/// JSON summary export, keyed model → mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonSummary {
    pub runs: BTreeMap<String, BTreeMap<Mode, RunSummary>>,
}

impl JsonSummary {
    /// Create from the merged hierarchy
    pub fn from_hierarchy(state: &HierarchyState) -> Self {
        let mut runs: BTreeMap<String, BTreeMap<Mode, RunSummary>> = BTreeMap::new();

        for (model, mode) in state.runs() {
            let headline = HeadlineResults::from_counts(&state.run_totals(&model, mode));
            let categories = state
                .subfields
                .iter()
                .filter_map(|(key, stats)| stats.run(&model, mode).map(|c| (key.clone(), c.clone())))
                .collect();

            runs.entry(model).or_default().insert(
                mode,
                RunSummary {
                    accuracy: headline.accuracy,
                    errors: headline.error_rate,
                    miss: headline.miss_rate,
                    accuracy_hard: headline.accuracy_hard,
                    accuracy_middle: headline.accuracy_middle,
                    accuracy_easy: headline.accuracy_easy,
                    categories,
                },
            );
        }

        Self { runs }
    }

    /// Write to JSON file
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }
}

/// Generate a console report of per-file results, sorted by model
pub fn print_console_report(files: &[FileSummary]) {
    println!("\n=== Evaluation Results ===");
    println!("Generated: {}\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));

    let mut sorted: Vec<&FileSummary> = files.iter().collect();
    sorted.sort_by(|a, b| {
        a.descriptor
            .model
            .cmp(&b.descriptor.model)
            .then(a.descriptor.mode.cmp(&b.descriptor.mode))
    });

    println!(
        "{:<30} {:<16} {:<10} {:>9} {:>9} {:>9}",
        "Model", "Split", "Mode", "Accuracy", "Errors", "Miss"
    );
    println!("{:-<88}", "");

    for file in sorted {
        println!(
            "{:<30} {:<16} {:<10} {:>9} {:>9} {:>9}",
            file.descriptor.model,
            file.descriptor.split,
            file.descriptor.mode.as_str(),
            format_percent(file.headline.accuracy),
            format_percent(file.headline.error_rate),
            format_percent(file.headline.miss_rate)
        );
    }

    println!("\n{:=<88}", "");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Difficulty, Taxonomy};
    use crate::scoring::Outcome;

    #[test]
    fn test_json_summary_shape() {
        let mut partial = HierarchyState::new();
        partial.fold(&Taxonomy::new("Science", "Physics", "Optics"), Outcome::Correct, Difficulty::Hard);
        partial.fold(&Taxonomy::new("Science", "Physics", "Optics"), Outcome::Miss, Difficulty::Easy);

        let mut state = HierarchyState::new();
        state.absorb_run("m1", Mode::FiveShot, &partial);

        let summary = JsonSummary::from_hierarchy(&state);
        let value = serde_json::to_value(&summary).unwrap();

        let run = &value["m1"]["five-shot"];
        assert_eq!(run["accuracy"], 0.5);
        assert_eq!(run["miss"], 0.5);
        assert_eq!(run["errors"], 0.0);
        assert_eq!(run["accuracy_hard"], 1.0);
        assert_eq!(run["categories"]["Science/Physics/Optics"]["total"], 2);
    }

    #[test]
    fn test_write_summary_round_trip() {
        let mut partial = HierarchyState::new();
        partial.fold(&Taxonomy::default(), Outcome::Error, Difficulty::Unknown);
        let mut state = HierarchyState::new();
        state.absorb_run("m", Mode::ZeroShot, &partial);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results_dev_m.json");
        let summary = JsonSummary::from_hierarchy(&state);
        summary.write_to_file(&path).unwrap();

        let reloaded: JsonSummary = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reloaded, summary);
    }
}
