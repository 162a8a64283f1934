//! Evaluation records and result-file loading

pub mod loader;
pub mod taxonomy;

pub use loader::{
    discover_files, load_records_from_file, load_records_from_str, write_records_to_file,
    FileSelection, LoadError, RunDescriptor,
};
pub use taxonomy::{Difficulty, Level, Mode, Taxonomy, UNKNOWN};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One benchmark question answered once by one model.
///
/// The record keeps the raw JSON object so that every input field survives the
/// round trip to the scored output file in its original order. Typed views are
/// exposed through accessors; missing or non-string taxonomy fields read as
/// [`UNKNOWN`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationRecord {
    fields: Map<String, Value>,
}

impl EvaluationRecord {
    /// Create a record from a response, its option texts and the gold letter
    pub fn new(
        response: impl Into<String>,
        options: Vec<String>,
        answer_letter: impl Into<String>,
    ) -> Self {
        let mut fields = Map::new();
        fields.insert("response".to_string(), Value::String(response.into()));
        fields.insert(
            "options".to_string(),
            Value::Array(options.into_iter().map(Value::String).collect()),
        );
        fields.insert("answer_letter".to_string(), Value::String(answer_letter.into()));
        Self { fields }
    }

    /// Wrap an already-parsed JSON value; only objects are records
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Set the taxonomy labels
    pub fn with_taxonomy(mut self, taxonomy: &Taxonomy) -> Self {
        self.set("discipline", Value::String(taxonomy.discipline.clone()));
        self.set("field", Value::String(taxonomy.field.clone()));
        self.set("subfield", Value::String(taxonomy.subfield.clone()));
        self
    }

    /// Set the difficulty tier
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.set("difficulty", Value::String(difficulty.as_str().to_string()));
        self
    }

    /// Overwrite an arbitrary field
    pub fn set(&mut self, key: &str, value: Value) {
        self.fields.insert(key.to_string(), value);
    }

    /// Raw model response; `Null` when absent
    pub fn response(&self) -> &Value {
        self.fields.get("response").unwrap_or(&Value::Null)
    }

    /// Raw option list; `Null` when absent
    pub fn options(&self) -> &Value {
        self.fields.get("options").unwrap_or(&Value::Null)
    }

    pub fn answer_letter(&self) -> Option<&str> {
        self.fields.get("answer_letter").and_then(Value::as_str)
    }

    pub fn taxonomy(&self) -> Taxonomy {
        Taxonomy::new(
            self.label("discipline"),
            self.label("field"),
            self.label("subfield"),
        )
    }

    pub fn difficulty(&self) -> Difficulty {
        self.fields
            .get("difficulty")
            .and_then(Value::as_str)
            .map(Difficulty::from_label)
            .unwrap_or_default()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    fn label(&self, key: &str) -> &str {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN)
    }
}
