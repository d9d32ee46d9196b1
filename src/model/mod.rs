//! Classifiers
//!
//! The responder only ever needs two answers from a model: the predicted
//! class and the probability of the positive class. [`Classifier`] is that
//! interface; [`xgboost::XgbClassifier`] is the implementation used in
//! production.

pub mod xgboost;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::error::PredictionError;

pub use xgboost::{ModelInfo, XgbClassifier};

/// Probability above which the positive class is predicted
pub const DECISION_THRESHOLD: f64 = 0.5;

/// A binary classifier over a fixed-width feature row
pub trait Classifier {
    /// Number of features a row must have
    fn num_features(&self) -> usize;

    /// Probability of the positive class (label 1)
    fn predict_probability(&self, features: &[f64]) -> Result<f64, PredictionError>;

    /// Predicted label, 0 or 1
    fn predict_class(&self, features: &[f64]) -> Result<u8, PredictionError> {
        let p = self.predict_probability(features)?;
        Ok(u8::from(p > DECISION_THRESHOLD))
    }
}

/// Reject rows of the wrong width before touching the model
pub(crate) fn check_width(expected: usize, features: &[f64]) -> Result<(), PredictionError> {
    if features.len() != expected {
        return Err(PredictionError::FeatureCount {
            expected,
            found: features.len(),
        });
    }
    Ok(())
}
