//! Result-file discovery, JSONL loading and scored-record persistence

use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use super::taxonomy::Mode;
use super::EvaluationRecord;

/// Error type for result-file loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {source_name} line {line}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("Invalid result file name: {0}")]
    FileName(String),
}

/// Model, split and mode encoded in a `{model}_{split}_{mode}.jsonl` file name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunDescriptor {
    pub file_name: String,
    pub model: String,
    pub split: String,
    pub mode: Mode,
}

impl RunDescriptor {
    /// Parse a result file name.
    ///
    /// With a non-empty `split` the name must contain `_{split}_`, which lets
    /// model names carry underscores; files for other splits or for modes not
    /// in `modes` yield `Ok(None)`. With an empty split the stem must be
    /// exactly `model_split_mode`.
    pub fn from_file_name(
        file_name: &str,
        split: &str,
        modes: &[Mode],
    ) -> Result<Option<Self>, LoadError> {
        let stem = file_name.strip_suffix(".jsonl").unwrap_or(file_name);

        if split.is_empty() {
            let parts: Vec<&str> = stem.split('_').collect();
            if parts.len() != 3 {
                return Err(LoadError::FileName(file_name.to_string()));
            }
            let mode: Mode = parts[2]
                .parse()
                .map_err(|_| LoadError::FileName(file_name.to_string()))?;
            return Ok(Some(Self {
                file_name: file_name.to_string(),
                model: parts[0].to_string(),
                split: parts[1].to_string(),
                mode,
            }));
        }

        let separator = format!("_{}_", split);
        let Some((model, mode)) = stem.split_once(&separator) else {
            return Ok(None);
        };
        let Ok(mode) = mode.parse::<Mode>() else {
            return Ok(None);
        };
        if !modes.contains(&mode) {
            return Ok(None);
        }

        Ok(Some(Self {
            file_name: file_name.to_string(),
            model: model.to_string(),
            split: split.to_string(),
            mode,
        }))
    }

    /// Column label used in reports
    pub fn column(&self) -> String {
        format!("{}_{}", self.model, self.mode)
    }
}

/// Which result files to evaluate
#[derive(Debug, Clone)]
pub struct FileSelection {
    pub evaluate_all: bool,
    pub models: Vec<String>,
    pub split: String,
    pub modes: Vec<Mode>,
}

impl FileSelection {
    /// Suffix shared by the report and summary file names
    pub fn output_suffix(&self) -> String {
        if self.evaluate_all {
            format!("{}_all_models", self.split)
        } else {
            format!("{}_{}", self.split, self.models.join("_"))
        }
    }
}

/// List result files in `dir` according to `selection`, sorted by name
pub fn discover_files(dir: impl AsRef<Path>, selection: &FileSelection) -> Result<Vec<String>, LoadError> {
    let dir = dir.as_ref();
    let mut files = Vec::new();

    if selection.evaluate_all {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(".jsonl") && entry.path().is_file() {
                files.push(name);
            }
        }
        files.sort();
    } else {
        for model in &selection.models {
            for mode in &selection.modes {
                let name = format!("{}_{}_{}.jsonl", model, selection.split, mode);
                if dir.join(&name).is_file() {
                    files.push(name);
                } else {
                    tracing::debug!("No result file {} in {}", name, dir.display());
                }
            }
        }
    }

    Ok(files)
}

/// Load evaluation records from a JSONL file
pub fn load_records_from_file(path: impl AsRef<Path>) -> Result<Vec<EvaluationRecord>, LoadError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    load_records_from_str(&content, &source_name)
}

/// Load evaluation records from JSONL text; blank lines are skipped
pub fn load_records_from_str(content: &str, source_name: &str) -> Result<Vec<EvaluationRecord>, LoadError> {
    let mut records = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(line).map_err(|e| LoadError::Parse {
            source_name: source_name.to_string(),
            line: idx + 1,
            message: e.to_string(),
        })?;
        let record = EvaluationRecord::from_value(value).ok_or_else(|| LoadError::Parse {
            source_name: source_name.to_string(),
            line: idx + 1,
            message: "expected a JSON object".to_string(),
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Write one JSON object per line, creating parent directories as needed
pub fn write_records_to_file<T: Serialize>(
    path: impl AsRef<Path>,
    records: &[T],
) -> Result<(), LoadError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(std::fs::File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record).map_err(|e| LoadError::Parse {
            source_name: path.display().to_string(),
            line: 0,
            message: e.to_string(),
        })?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_name_with_split() {
        let modes = Mode::all();
        let run = RunDescriptor::from_file_name("qwen_2_7b_SuperGPQA-all_five-shot.jsonl", "SuperGPQA-all", &modes)
            .unwrap()
            .unwrap();
        assert_eq!(run.model, "qwen_2_7b");
        assert_eq!(run.split, "SuperGPQA-all");
        assert_eq!(run.mode, Mode::FiveShot);
        assert_eq!(run.column(), "qwen_2_7b_five-shot");
    }

    #[test]
    fn test_parse_file_name_filters_split_and_mode() {
        let zero_only = [Mode::ZeroShot];
        assert!(RunDescriptor::from_file_name("m_other_zero-shot.jsonl", "SuperGPQA-all", &zero_only)
            .unwrap()
            .is_none());
        assert!(RunDescriptor::from_file_name("m_SuperGPQA-all_five-shot.jsonl", "SuperGPQA-all", &zero_only)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_parse_file_name_without_split() {
        let run = RunDescriptor::from_file_name("gpt4o_dev_zero-shot.jsonl", "", &Mode::all())
            .unwrap()
            .unwrap();
        assert_eq!(run.model, "gpt4o");
        assert_eq!(run.split, "dev");

        let err = RunDescriptor::from_file_name("gpt_4o_dev_zero-shot.jsonl", "", &Mode::all());
        assert!(matches!(err, Err(LoadError::FileName(_))));
    }

    #[test]
    fn test_load_records_skips_blank_lines() {
        let content = "{\"response\":\"A\",\"options\":[\"x\"],\"answer_letter\":\"A\"}\n\n{\"response\":\"B\",\"options\":[\"x\",\"y\"],\"answer_letter\":\"A\"}\n";
        let records = load_records_from_str(content, "test.jsonl").unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_load_records_reports_line() {
        let content = "{\"response\":\"A\"}\nnot json\n";
        match load_records_from_str(content, "broken.jsonl") {
            Err(LoadError::Parse { source_name, line, .. }) => {
                assert_eq!(source_name, "broken.jsonl");
                assert_eq!(line, 2);
            }
            other => panic!("expected parse error, got {:?}", other),
        }

        assert!(load_records_from_str("[1, 2]\n", "array.jsonl").is_err());
    }

    #[test]
    fn test_discover_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "b_SuperGPQA-all_zero-shot.jsonl",
            "a_SuperGPQA-all_zero-shot.jsonl",
            "a_SuperGPQA-all_five-shot.jsonl",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let all = FileSelection {
            evaluate_all: true,
            models: Vec::new(),
            split: "SuperGPQA-all".to_string(),
            modes: Mode::all(),
        };
        assert_eq!(
            discover_files(dir.path(), &all).unwrap(),
            vec![
                "a_SuperGPQA-all_five-shot.jsonl",
                "a_SuperGPQA-all_zero-shot.jsonl",
                "b_SuperGPQA-all_zero-shot.jsonl",
            ]
        );
        assert_eq!(all.output_suffix(), "SuperGPQA-all_all_models");

        let picked = FileSelection {
            evaluate_all: false,
            models: vec!["a".to_string(), "c".to_string()],
            split: "SuperGPQA-all".to_string(),
            modes: vec![Mode::ZeroShot],
        };
        assert_eq!(
            discover_files(dir.path(), &picked).unwrap(),
            vec!["a_SuperGPQA-all_zero-shot.jsonl"]
        );
        assert_eq!(picked.output_suffix(), "SuperGPQA-all_a_c");
    }

    #[test]
    fn test_write_records_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.jsonl");
        let records = load_records_from_str("{\"response\":\"A\"}\n{\"response\":\"B\"}\n", "in.jsonl").unwrap();

        write_records_to_file(&path, &records).unwrap();

        let reloaded = load_records_from_file(&path).unwrap();
        assert_eq!(reloaded, records);
    }
}
