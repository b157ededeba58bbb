use crate::model::TestResult;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckPatternType {
    /// Every byte is verified.
    Correct,
    /// No byte is verified.
    None,
    Partial,
    Unknown,
}

impl fmt::Display for CheckPatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CheckPatternType::Correct => "correct",
            CheckPatternType::None => "none",
            CheckPatternType::Partial => "partial",
            CheckPatternType::Unknown => "unknown",
        };
        write!(f, "{}", label)
    }
}

/// Per-offset outcome of a byte oracle plus its classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckPattern {
    pub pattern: CheckPatternType,
    pub checked_bytes: Vec<bool>,
    /// Set when an exchange failed and the map is incomplete.
    #[serde(default)]
    pub erroneous: bool,
}

impl CheckPattern {
    pub fn classify(checked_bytes: Vec<bool>) -> Self {
        let pattern = if checked_bytes.is_empty() {
            CheckPatternType::Unknown
        } else if checked_bytes.iter().all(|checked| !checked) {
            CheckPatternType::None
        } else if checked_bytes.iter().all(|checked| *checked) {
            CheckPatternType::Correct
        } else {
            CheckPatternType::Partial
        };
        Self {
            pattern,
            checked_bytes,
            erroneous: false,
        }
    }

    pub fn unknown() -> Self {
        Self {
            pattern: CheckPatternType::Unknown,
            checked_bytes: Vec::new(),
            erroneous: false,
        }
    }

    pub fn erroneous() -> Self {
        Self {
            erroneous: true,
            ..Self::unknown()
        }
    }

    /// Whether the peer fully verifies the tag.
    pub fn verdict(&self) -> TestResult {
        match self.pattern {
            CheckPatternType::Correct => TestResult::True,
            CheckPatternType::None | CheckPatternType::Partial => TestResult::False,
            CheckPatternType::Unknown if self.erroneous => TestResult::ErrorDuringTest,
            CheckPatternType::Unknown => TestResult::CouldNotTest,
        }
    }
}
