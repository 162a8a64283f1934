//! Per-sample scoring

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::extraction::{AnswerExtractor, ExtractionResult};
use crate::records::{EvaluationRecord, Mode};

/// Classified outcome of one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Incorrect,
    Miss,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Correct => "correct",
            Outcome::Incorrect => "incorrect",
            Outcome::Miss => "miss",
            Outcome::Error => "error",
        }
    }

    /// Classify an extraction against the gold letter
    pub fn classify(extracted: ExtractionResult, gold: Option<&str>) -> Self {
        match extracted {
            ExtractionResult::Malformed => Outcome::Error,
            ExtractionResult::NoMatch => Outcome::Miss,
            ExtractionResult::Letter(letter) => {
                let mut buf = [0u8; 4];
                let letter: &str = letter.encode_utf8(&mut buf);
                if gold == Some(letter) {
                    Outcome::Correct
                } else {
                    Outcome::Incorrect
                }
            }
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A record together with its extraction and outcome.
///
/// Serializes as the original object followed by `extracted_answer` and
/// `status`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: EvaluationRecord,
    pub extracted: ExtractionResult,
    pub outcome: Outcome,
}

impl ScoredRecord {
    /// The derived JSON object persisted to the scored output file
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = self.record.fields().clone();
        fields.insert("extracted_answer".to_string(), self.extracted.to_value());
        fields.insert("status".to_string(), Value::String(self.outcome.as_str().to_string()));
        fields
    }
}

impl Serialize for ScoredRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_fields().serialize(serializer)
    }
}

/// Scores evaluation records with a shared extractor
pub struct SampleScorer {
    extractor: AnswerExtractor,
}

impl SampleScorer {
    pub fn new(extractor: AnswerExtractor) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> &AnswerExtractor {
        &self.extractor
    }

    /// Score one record; the input is left untouched
    pub fn score(&self, record: &EvaluationRecord, mode: Mode) -> ScoredRecord {
        let extracted = self
            .extractor
            .extract_for_mode(record.response(), record.options(), mode);
        let outcome = Outcome::classify(extracted, record.answer_letter());

        ScoredRecord {
            record: record.clone(),
            extracted,
            outcome,
        }
    }
}

impl Default for SampleScorer {
    fn default() -> Self {
        Self::new(AnswerExtractor::new())
    }
}
