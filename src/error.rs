//! Error types
//!
//! Each flow gets its own error kind so the chat shell can tell a typo in the
//! user's input apart from a broken model, and the loader can fail loudly
//! without touching the chat side.

use std::path::PathBuf;
use thiserror::Error;

/// The user's text could not be turned into a feature vector
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("value {position} ('{token}') is not a number")]
    InvalidNumber { position: usize, token: String },

    #[error("expected {expected} comma-separated values, got {found}")]
    WrongCount { expected: usize, found: usize },
}

/// The classifier rejected an input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("model expects {expected} features, got {found}")]
    FeatureCount { expected: usize, found: usize },

    #[error("tree {tree} is malformed at node {node}")]
    InvalidTree { tree: usize, node: usize },
}

/// A model artifact could not be loaded
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("failed to read model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model is not valid XGBoost JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported model: {0}")]
    Unsupported(String),

    #[error("malformed model: {0}")]
    Malformed(String),
}

/// Either half of answering a chat message failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnswerError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl AnswerError {
    /// Text shown to the user in place of a prediction
    ///
    /// Input problems are explained; model problems are not, since the user
    /// can't do anything about them.
    pub fn user_message(&self) -> String {
        match self {
            AnswerError::Parse(e) => format!(
                "Sorry, I couldn't read that: {}. Please send five comma-separated numbers: {}.",
                e,
                crate::features::FEATURE_NAMES.join(", ")
            ),
            AnswerError::Prediction(_) => {
                "Sorry, something went wrong while running the prediction. Please try again later."
                    .to_string()
            }
        }
    }
}

/// The bulk load failed; the destination table is left as it was
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV has no header row")]
    EmptyHeader,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Database(#[from] diesel::result::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message_shows_expected_format() {
        let err = AnswerError::from(ParseError::WrongCount { expected: 5, found: 2 });
        let msg = err.user_message();

        assert!(msg.contains("expected 5 comma-separated values, got 2"));
        assert!(msg.contains("hba1c, glucose_postprandial"));
    }

    #[test]
    fn test_prediction_error_message_is_generic() {
        let err = AnswerError::from(PredictionError::FeatureCount { expected: 8, found: 5 });
        let msg = err.user_message();

        // Internals stay in the logs
        assert!(!msg.contains('8'));
        assert!(msg.contains("something went wrong"));
    }
}
