//! Severity classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three severity levels the structured report format recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Note,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Level::Note => "note",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        f.write_str(label)
    }
}

/// Map a CVSS-style score to a report level.
///
/// Total over the reals: scores of 7 and above are errors, anything
/// strictly between 0 and 7 is a warning, and everything else (zero,
/// negatives, NaN) conservatively lands on note.
pub fn classify(score: f64) -> Level {
    if score >= 7.0 {
        Level::Error
    } else if score > 0.0 {
        Level::Warning
    } else {
        Level::Note
    }
}
