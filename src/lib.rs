//! diacheck - diabetes check chatbot and dataset loader
//!
//! Two independent tools that share a binary:
//!
//! 1. **Bulk loader**: copies a CSV health dataset into an SQLite table,
//!    replacing whatever was there, and reads a few rows back.
//!
//! 2. **Chat responder**: reads five health indicators from free text, runs
//!    them through a pre-trained XGBoost classifier and answers with the
//!    predicted class and the probability of diabetes.
//!
//! # Quick Start
//!
//! ```no_run
//! use diacheck::{ChatSession, XgbClassifier};
//!
//! let model = XgbClassifier::open("model/models/xgboost_model_v01.json")?;
//! let mut session = ChatSession::new();
//!
//! let reply = session.handle_turn("8.18, 236, 136, 0, 58", &model);
//! println!("{}", reply.content);
//! // The prediction is: 1 with probability of having diabetes: 83.15%.
//! # Ok::<(), diacheck::ModelError>(())
//! ```
//!
//! # Input Format
//!
//! Exactly five comma-separated numbers, in the order the model was trained
//! on:
//!
//! | # | Feature                   |
//! |---|---------------------------|
//! | 1 | `hba1c`                   |
//! | 2 | `glucose_postprandial`    |
//! | 3 | `glucose_fasting`         |
//! | 4 | `family_history_diabetes` |
//! | 5 | `age`                     |
//!
//! # Modules
//!
//! - [`features`]: input parsing
//! - [`model`]: the [`Classifier`] interface and the XGBoost evaluator
//! - [`respond`]: prediction and response formatting
//! - [`session`]: chat transcripts
//! - [`loader`] / [`db`]: CSV → SQLite replace-load
//! - [`serve`]: browser chat

pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod loader;
pub mod model;
pub mod respond;
pub mod serve;
pub mod session;

pub use error::{AnswerError, LoadError, ModelError, ParseError, PredictionError};
pub use features::{FeatureVector, FEATURE_NAMES};
pub use loader::{load, LoadReport};
pub use model::{Classifier, ModelInfo, XgbClassifier};
pub use respond::{format_response, generate_answer, predict, Prediction};
pub use session::{ChatMessage, ChatSession, Role};

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // PUBLIC API TESTS
    // ==========================================================================
    //
    // These tests verify the public API surface is reachable from the crate
    // root.
    // ==========================================================================

    #[test]
    fn test_public_exports() {
        let _: Role = Role::User;
        let _session = ChatSession::new();
        assert_eq!(FEATURE_NAMES.len(), 5);
    }

    #[test]
    fn test_pipeline_from_crate_root() {
        let model = XgbClassifier::from_json(&model::fixtures::two_tree_model("5E-1")).unwrap();
        let vector = FeatureVector::parse("8.18, 236, 136, 0, 58").unwrap();

        let p = predict(&model, &vector).unwrap();
        let text = format_response(p.class, p.probability);

        assert_eq!(text, generate_answer("8.18, 236, 136, 0, 58", &model).unwrap());
    }
}
