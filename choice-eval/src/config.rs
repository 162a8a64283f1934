//! Configuration management for the evaluator
//!
//! Loads evaluation settings from a TOML file; command-line flags override
//! whatever is loaded here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::records::Mode;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/eval.toml";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Which files to score and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default = "default_split")]
    pub split: String,
    #[serde(default = "Mode::all")]
    pub modes: Vec<Mode>,
    /// Directory holding the `{model}_{split}_{mode}.jsonl` result files
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Directory receiving scored records and reports
    #[serde(default = "default_save_dir")]
    pub save_dir: String,
    /// Wall-clock budget for a single pattern match
    #[serde(default = "default_match_timeout_ms")]
    pub match_timeout_ms: u64,
    /// Concurrent file workers; 0 uses the available parallelism
    #[serde(default)]
    pub max_workers: usize,
}

/// Output toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Write the per-metric report tables
    #[serde(default)]
    pub table: bool,
    /// Write the JSON summary
    #[serde(default)]
    pub json: bool,
    /// Write scored copies of the input files
    #[serde(default = "default_true")]
    pub scored_records: bool,
}

fn default_true() -> bool { true }
fn default_split() -> String { "SuperGPQA-all".to_string() }
fn default_output_dir() -> String { "results/gpqa".to_string() }
fn default_save_dir() -> String { "results_with_status/gpqa".to_string() }
fn default_match_timeout_ms() -> u64 { 5_000 }

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            split: default_split(),
            modes: Mode::all(),
            output_dir: default_output_dir(),
            save_dir: default_save_dir(),
            match_timeout_ms: default_match_timeout_ms(),
            max_workers: 0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            table: false,
            json: false,
            scored_records: true,
        }
    }
}

impl EvaluationConfig {
    pub fn match_budget(&self) -> Duration {
        Duration::from_millis(self.match_timeout_ms)
    }

    pub fn input_dir(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }

    pub fn save_path(&self) -> PathBuf {
        PathBuf::from(&self.save_dir)
    }
}

impl EvalConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from `path` (or the default location) or return defaults.
    ///
    /// An explicitly given path that cannot be loaded is an error; a missing
    /// default file is not.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            let config = Self::from_file(path)?;
            tracing::info!("Loaded configuration from {}", path.display());
            return Ok(config);
        }

        if Path::new(DEFAULT_CONFIG_PATH).is_file() {
            let config = Self::from_file(DEFAULT_CONFIG_PATH)?;
            tracing::info!("Loaded configuration from {}", DEFAULT_CONFIG_PATH);
            return Ok(config);
        }

        tracing::info!("Using default configuration");
        Ok(Self::default())
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        fs::write(path, content)
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
