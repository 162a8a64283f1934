//! Surface-form patterns for locating a chosen option in free text
//!
//! Every form is built around a single capture group (`target`), which is
//! either a letter class such as `[ABCD]` or an alternation of escaped option
//! texts. The target may be wrapped in emphasis markers, `$`, brackets or
//! LaTeX commands (`\boxed{}`, `\mathbf{}`, `\mathrm{}`, `\text{}`) and must be
//! followed by whitespace, `:`, `.`, `*`, `)` or the end of the text.

use regex::{Regex, RegexBuilder};

/// Option letters in presentation order
pub const OPTION_LETTERS: &str = "ABCDEFGHIJ";

/// Largest option set an answer can be extracted from
pub const MAX_OPTIONS: usize = 10;

/// Compiled-size cap per pattern; option alternations are user-controlled
const PATTERN_SIZE_LIMIT: usize = 4 * (1 << 20);

const WRAP_OPEN: &str = r"(?:[*$\\\{(\[]*?(?:(?:\\boxed|\\mathbf|\\mathrm|\\text)\{)?)*";
const WRAP_CLOSE: &str = r"(?:\\?\}?\$?\)?\]?\}?)*";
const BOUNDARY: &str = r"(?:[\s:.*)]|$)";
const TRAILER: &str = r"[\s:.*)]*$";

/// The three surface forms, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceForm {
    /// "The (final) answer is (B)."
    Statement,
    /// "Answer: $\boxed{B}$"
    AnswerLabel,
    /// A text consisting of nothing but the optionally wrapped target
    Bare,
}

impl SurfaceForm {
    pub fn all() -> [SurfaceForm; 3] {
        [SurfaceForm::Statement, SurfaceForm::AnswerLabel, SurfaceForm::Bare]
    }

    /// Pattern source for this form around `target`, which must be a single
    /// capture group
    pub fn source(&self, target: &str) -> String {
        match self {
            SurfaceForm::Statement => format!(
                r"(?i:the)\s+(?:\w+\s+)?(?i:answer|option)(?:\s+\w+){{0,4}}?\s+(?i:is):?\s*{WRAP_OPEN}\s*{target}{WRAP_CLOSE}{BOUNDARY}"
            ),
            SurfaceForm::AnswerLabel => format!(
                r"(?i:answer)[*\s]*:\s*{WRAP_OPEN}\s*{target}{WRAP_CLOSE}{BOUNDARY}"
            ),
            SurfaceForm::Bare => format!(
                r"^[^\w\r\n]*{WRAP_OPEN}\s*{target}{WRAP_CLOSE}{TRAILER}"
            ),
        }
    }
}

/// Letters valid for an option list of `option_count` entries; empty when
/// there are no options
pub fn alphabet(option_count: usize) -> &'static str {
    &OPTION_LETTERS[..option_count.min(MAX_OPTIONS)]
}

/// Capture group matching one letter of `letters`
pub fn letter_target(letters: &str) -> String {
    format!("([{}])", letters)
}

/// Capture group matching any non-empty option text literally, or `None`
/// when no option has text
pub fn content_target(options: &[&str]) -> Option<String> {
    let escaped: Vec<String> = options
        .iter()
        .filter(|o| !o.is_empty())
        .map(|o| regex::escape(o))
        .collect();

    if escaped.is_empty() {
        None
    } else {
        Some(format!("({})", escaped.join("|")))
    }
}

/// Compile all three forms around `target`; forms that fail to compile are
/// logged and left out
pub fn compile_forms(target: &str) -> Vec<Regex> {
    SurfaceForm::all()
        .iter()
        .filter_map(|form| {
            let source = form.source(target);
            match RegexBuilder::new(&source).size_limit(PATTERN_SIZE_LIMIT).build() {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!("Skipping {:?} pattern that failed to compile: {}", form, e);
                    None
                }
            }
        })
        .collect()
}
