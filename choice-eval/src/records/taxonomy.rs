//! Taxonomy, difficulty and prompting-mode definitions

use serde::{Deserialize, Serialize};

/// Label used for any taxonomy level or tier missing from a record
pub const UNKNOWN: &str = "unknown";

/// Difficulty tier of a benchmark question
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Middle,
    Hard,
    Unknown,
}

impl Difficulty {
    /// The three tiers that get their own accuracy metric
    pub fn ranked() -> [Difficulty; 3] {
        [Difficulty::Hard, Difficulty::Middle, Difficulty::Easy]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Middle => "middle",
            Difficulty::Hard => "hard",
            Difficulty::Unknown => UNKNOWN,
        }
    }

    /// Lenient parse used for record fields: anything unrecognised is `Unknown`
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(Difficulty::Unknown)
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Unknown
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "middle" | "medium" => Ok(Difficulty::Middle),
            "hard" => Ok(Difficulty::Hard),
            "unknown" => Ok(Difficulty::Unknown),
            _ => Err(format!("Unknown difficulty: {}", s)),
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Prompting strategy used to elicit a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "zero-shot")]
    ZeroShot,
    #[serde(rename = "five-shot")]
    FiveShot,
}

impl Mode {
    pub fn all() -> Vec<Mode> {
        vec![Mode::ZeroShot, Mode::FiveShot]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::ZeroShot => "zero-shot",
            Mode::FiveShot => "five-shot",
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zero-shot" | "zero_shot" | "zeroshot" => Ok(Mode::ZeroShot),
            "five-shot" | "five_shot" | "fiveshot" => Ok(Mode::FiveShot),
            _ => Err(format!("Unknown mode: {}", s)),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Grouping level of the discipline → field → subfield taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Discipline,
    Field,
    Subfield,
}

impl Level {
    pub fn all() -> [Level; 3] {
        [Level::Discipline, Level::Field, Level::Subfield]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Discipline => "discipline",
            Level::Field => "field",
            Level::Subfield => "subfield",
        }
    }
}

/// The three taxonomy labels of one question
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Taxonomy {
    pub discipline: String,
    pub field: String,
    pub subfield: String,
}

impl Taxonomy {
    pub fn new(
        discipline: impl Into<String>,
        field: impl Into<String>,
        subfield: impl Into<String>,
    ) -> Self {
        Self {
            discipline: discipline.into(),
            field: field.into(),
            subfield: subfield.into(),
        }
    }

    /// Aggregation key at `level`; deeper keys are prefixed by their parents
    pub fn key(&self, level: Level) -> String {
        match level {
            Level::Discipline => self.discipline.clone(),
            Level::Field => format!("{}/{}", self.discipline, self.field),
            Level::Subfield => format!("{}/{}/{}", self.discipline, self.field, self.subfield),
        }
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::new(UNKNOWN, UNKNOWN, UNKNOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_difficulty() {
        assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!("MIDDLE".parse::<Difficulty>().unwrap(), Difficulty::Middle);
        assert_eq!(Difficulty::from_label("extreme"), Difficulty::Unknown);
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("zero-shot".parse::<Mode>().unwrap(), Mode::ZeroShot);
        assert_eq!("five-shot".parse::<Mode>().unwrap(), Mode::FiveShot);
        assert!("ten-shot".parse::<Mode>().is_err());
    }

    #[test]
    fn test_taxonomy_keys_are_prefixed() {
        let taxonomy = Taxonomy::new("Science", "Physics", "Optics");
        assert_eq!(taxonomy.key(Level::Discipline), "Science");
        assert_eq!(taxonomy.key(Level::Field), "Science/Physics");
        assert_eq!(taxonomy.key(Level::Subfield), "Science/Physics/Optics");
    }
}
