//! Error types for section trees and distance computation.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, DistanceError>;

/// Which paragraph of a pair a section lookup belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSide {
    First,
    Second,
}

impl fmt::Display for PairSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairSide::First => write!(f, "first"),
            PairSide::Second => write!(f, "second"),
        }
    }
}

/// Errors that can occur while building trees or computing distances.
#[derive(Error, Debug)]
pub enum DistanceError {
    /// A page has no section labels to build a tree from.
    #[error("Cannot build a section tree from an empty section set")]
    EmptySectionSet,

    /// Section paths of one page do not share the same page segment.
    #[error("Section path '{found}' does not belong to page '{expected}'")]
    InconsistentPageRoot { expected: String, found: String },

    /// Distance requested without a section tree.
    #[error("Root not found: no section tree was built")]
    RootMissing,

    /// A paragraph's section path is not present in its page tree.
    #[error("Section '{path}' of the {which} paragraph is not in the section tree")]
    SectionNotFound { which: PairSide, path: String },

    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Malformed line in a qrels file (1-indexed line number).
    #[error("Malformed qrels line {line}: {message}")]
    QrelsParse { line: usize, message: String },

    /// The corpus directory does not exist or is not a directory.
    #[error("Corpus path '{0}' does not exist or is not a directory")]
    InvalidCorpusPath(PathBuf),

    /// The results file does not exist.
    #[error("Results file not found at '{0}'")]
    ResultsNotFound(PathBuf),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DistanceError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from tree construction rather than a single pair.
    pub fn is_tree_error(&self) -> bool {
        matches!(
            self,
            DistanceError::EmptySectionSet | DistanceError::InconsistentPageRoot { .. }
        )
    }
}

impl From<serde_json::Error> for DistanceError {
    fn from(err: serde_json::Error) -> Self {
        DistanceError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_not_found_names_the_side() {
        let err = DistanceError::SectionNotFound {
            which: PairSide::Second,
            path: "Page/Missing".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("second"));
        assert!(msg.contains("Page/Missing"));
    }

    #[test]
    fn test_tree_error_classification() {
        assert!(DistanceError::EmptySectionSet.is_tree_error());
        assert!(
            DistanceError::InconsistentPageRoot {
                expected: "a".into(),
                found: "b/c".into()
            }
            .is_tree_error()
        );
        assert!(!DistanceError::RootMissing.is_tree_error());
    }
}
