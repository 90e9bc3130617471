//! Error types for the CHRONICLE core library.
//!
//! The episodic memory never fails on ordinary misses (unknown ids, empty
//! queries); those return `None` or an empty list. Errors are reserved for
//! caller contract violations and for configuration / snapshot decoding.

use thiserror::Error;

/// Top-level error type for all CHRONICLE operations.
#[derive(Error, Debug)]
pub enum ChronicleError {
    /// A hierarchy level outside `0..max_levels` was supplied.
    #[error("Level out of range: {level} (levels: 0..{max_levels})")]
    LevelOutOfRange {
        /// The offending level.
        level: usize,
        /// Number of configured levels.
        max_levels: usize,
    },

    /// Predicted and actual vectors differ in length.
    #[error("Dimension mismatch: predicted has {predicted} components, actual has {actual}")]
    DimensionMismatch {
        /// Length of the predicted vector.
        predicted: usize,
        /// Length of the actual vector.
        actual: usize,
    },

    /// A predicted, actual or resulting error component is NaN or infinite.
    #[error("Non-finite component at index {index}")]
    NonFiniteComponent {
        /// Index of the first offending component.
        index: usize,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ChronicleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for ChronicleError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, ChronicleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_violation() {
        let err = ChronicleError::LevelOutOfRange {
            level: 7,
            max_levels: 5,
        };
        assert_eq!(err.to_string(), "Level out of range: 7 (levels: 0..5)");

        let err = ChronicleError::DimensionMismatch {
            predicted: 3,
            actual: 2,
        };
        assert!(err.to_string().contains("predicted has 3"));

        let err = ChronicleError::NonFiniteComponent { index: 4 };
        assert_eq!(err.to_string(), "Non-finite component at index 4");
    }

    #[test]
    fn json_errors_become_serialization_errors() {
        let parse = serde_json::from_str::<Vec<f64>>("not json");
        let err = ChronicleError::from(parse.expect_err("must fail"));
        assert!(matches!(err, ChronicleError::Serialization(_)));
    }
}
