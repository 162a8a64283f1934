//! Answer extraction: free-text model output → one option letter
//!
//! Extraction runs in two phases. The label phase looks for an option letter
//! in one of the [`SurfaceForm`]s; the content phase looks for the literal text
//! of an option in the same forms and maps it back to its letter. Each phase
//! searches the last non-empty line first and the full response second, and
//! the first form that matches wins.

pub mod guard;
pub mod patterns;

pub use guard::{GuardedMatcher, DEFAULT_MATCH_BUDGET};
pub use patterns::{SurfaceForm, MAX_OPTIONS, OPTION_LETTERS};

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;

use crate::records::Mode;

/// Token at which a five-shot response starts hallucinating the next question
pub const FEW_SHOT_BOUNDARY: &str = "Question:";

/// Value persisted as `extracted_answer` for malformed input
pub const MALFORMED_MARKER: &str = "error";

/// Outcome of extracting an answer from one response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionResult {
    /// An option letter within the record's alphabet
    Letter(char),
    /// No surface form matched
    NoMatch,
    /// The response or the option list was not well-formed
    Malformed,
}

impl ExtractionResult {
    pub fn letter(&self) -> Option<char> {
        match self {
            ExtractionResult::Letter(c) => Some(*c),
            _ => None,
        }
    }

    /// JSON value stored as `extracted_answer`: the letter, `null` or `"error"`
    pub fn to_value(&self) -> Value {
        match self {
            ExtractionResult::Letter(c) => Value::String(c.to_string()),
            ExtractionResult::NoMatch => Value::Null,
            ExtractionResult::Malformed => Value::String(MALFORMED_MARKER.to_string()),
        }
    }
}

/// Extracts the chosen option from model responses
pub struct AnswerExtractor {
    matcher: GuardedMatcher,
    /// Letter patterns indexed by alphabet size - 1
    label_forms: Vec<Vec<Regex>>,
}

impl AnswerExtractor {
    /// Create an extractor with the default 5 second match budget
    pub fn new() -> Self {
        Self::with_budget(DEFAULT_MATCH_BUDGET)
    }

    /// Create an extractor with a custom per-match budget
    pub fn with_budget(budget: Duration) -> Self {
        let label_forms = (1..=MAX_OPTIONS)
            .map(|size| patterns::compile_forms(&patterns::letter_target(&OPTION_LETTERS[..size])))
            .collect();

        Self {
            matcher: GuardedMatcher::new(budget),
            label_forms,
        }
    }

    /// Extract from raw JSON fields, validating their shape first
    pub fn extract(&self, response: &Value, options: &Value) -> ExtractionResult {
        match (response.as_str(), option_texts(options)) {
            (Some(response), Some(options)) => self.extract_text(response, &options),
            _ => ExtractionResult::Malformed,
        }
    }

    /// Extract with the refinement for `mode`.
    ///
    /// Five-shot responses are cut at the first [`FEW_SHOT_BOUNDARY`] and the
    /// prefix is tried first; the untruncated response is only searched when
    /// the prefix yields no match.
    pub fn extract_for_mode(&self, response: &Value, options: &Value, mode: Mode) -> ExtractionResult {
        let (Some(response), Some(options)) = (response.as_str(), option_texts(options)) else {
            return ExtractionResult::Malformed;
        };

        match mode {
            Mode::ZeroShot => self.extract_text(response, &options),
            Mode::FiveShot => {
                let prefix = response.split(FEW_SHOT_BOUNDARY).next().unwrap_or(response);
                let result = self.extract_text(prefix, &options);
                if result == ExtractionResult::NoMatch && prefix.len() < response.len() {
                    self.extract_text(response, &options)
                } else {
                    result
                }
            }
        }
    }

    /// Extract from already-validated text; never returns `Malformed`
    pub fn extract_text(&self, response: &str, options: &[&str]) -> ExtractionResult {
        let text = response.trim_end();
        if text.is_empty() {
            return ExtractionResult::NoMatch;
        }

        let last_line = text.rsplit('\n').next().unwrap_or(text);
        let mut scopes: Vec<Arc<str>> = vec![Arc::from(last_line)];
        if last_line.len() < text.len() {
            scopes.push(Arc::from(text));
        }

        if let Some(letter) = self.extract_label(&scopes, options.len()) {
            return ExtractionResult::Letter(letter);
        }

        match self.extract_content(&scopes, options) {
            Some(index) => ExtractionResult::Letter(letter_at(index)),
            None => ExtractionResult::NoMatch,
        }
    }

    fn extract_label(&self, scopes: &[Arc<str>], option_count: usize) -> Option<char> {
        let size = patterns::alphabet(option_count).len();
        let forms = self.label_forms.get(size.checked_sub(1)?)?;

        self.first_capture(forms, scopes)
            .and_then(|label| label.chars().next())
    }

    fn extract_content(&self, scopes: &[Arc<str>], options: &[&str]) -> Option<usize> {
        let candidates = &options[..options.len().min(MAX_OPTIONS)];
        let target = patterns::content_target(candidates)?;
        let forms = patterns::compile_forms(&target);

        let matched = self.first_capture(&forms, scopes)?;
        candidates.iter().position(|option| *option == matched)
    }

    fn first_capture(&self, forms: &[Regex], scopes: &[Arc<str>]) -> Option<String> {
        scopes
            .iter()
            .flat_map(|scope| forms.iter().map(move |form| (form, scope)))
            .find_map(|(form, scope)| self.matcher.capture(form, scope))
    }
}

impl Default for AnswerExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Option texts when `options` is a JSON array of strings
fn option_texts(options: &Value) -> Option<Vec<&str>> {
    options.as_array()?.iter().map(Value::as_str).collect()
}

fn letter_at(index: usize) -> char {
    OPTION_LETTERS.as_bytes()[index] as char
}
