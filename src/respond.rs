//! Turning chat text into an answer
//!
//! parse → predict → format, each step a plain function so the shell can
//! call them separately or through [`generate_answer`].

use crate::error::{AnswerError, PredictionError};
use crate::features::FeatureVector;
use crate::model::Classifier;
use serde::Serialize;

/// Class label and positive-class probability for one input
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub class: u8,
    pub probability: f64,
}

/// Ask the model for a label and a probability
///
/// Model errors are returned as-is; there is no retry.
pub fn predict<C: Classifier + ?Sized>(
    model: &C,
    vector: &FeatureVector,
) -> Result<Prediction, PredictionError> {
    let row = vector.as_slice();
    let class = model.predict_class(row)?;
    let probability = model.predict_probability(row)?;
    Ok(Prediction { class, probability })
}

/// The sentence shown to the user
pub fn format_response(prediction: u8, probability: f64) -> String {
    format!(
        "The prediction is: {} with probability of having diabetes: {:.2}%.",
        prediction,
        probability * 100.0
    )
}

/// Answer one chat message
pub fn generate_answer<C: Classifier + ?Sized>(text: &str, model: &C) -> Result<String, AnswerError> {
    let vector = FeatureVector::parse(text)?;
    let prediction = predict(model, &vector)?;
    tracing::debug!(
        input = ?vector.as_slice(),
        class = prediction.class,
        probability = prediction.probability,
        "prediction"
    );
    Ok(format_response(prediction.class, prediction.probability))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::model::fixtures;
    use crate::model::testing::FixedClassifier;
    use crate::model::XgbClassifier;

    // ==========================================================================
    // FORMATTING
    // ==========================================================================

    #[test]
    fn test_format_documented_example() {
        assert_eq!(
            format_response(1, 0.8315),
            "The prediction is: 1 with probability of having diabetes: 83.15%."
        );
    }

    #[test]
    fn test_format_rounds_to_two_places() {
        assert_eq!(
            format_response(0, 0.123456),
            "The prediction is: 0 with probability of having diabetes: 12.35%."
        );
    }

    #[test]
    fn test_format_extremes() {
        assert!(format_response(0, 0.0).ends_with(": 0.00%."));
        assert!(format_response(1, 1.0).ends_with(": 100.00%."));
    }

    // ==========================================================================
    // PREDICTION
    // ==========================================================================

    #[test]
    fn test_predict_asks_for_class_and_probability() {
        let model = FixedClassifier::new(1, 0.5);
        let v = FeatureVector::parse("8.18, 236, 136, 0, 58").unwrap();

        let p = predict(&model, &v).unwrap();

        assert_eq!(p, Prediction { class: 1, probability: 0.5 });
        assert_eq!(model.calls.get(), 2);
    }

    #[test]
    fn test_predict_propagates_model_error() {
        let model = FixedClassifier::new(1, 0.5).with_width(8);
        let v = FeatureVector::new([0.0; 5]);

        let err = predict(&model, &v).unwrap_err();
        assert_eq!(err, PredictionError::FeatureCount { expected: 8, found: 5 });
    }

    // ==========================================================================
    // END TO END
    // ==========================================================================

    #[test]
    fn test_answer_is_deterministic() {
        let model = FixedClassifier::new(1, 0.5);
        let text = "8.18, 236, 136, 0, 58";

        let first = generate_answer(text, &model).unwrap();
        let second = generate_answer(text, &model).unwrap();

        assert_eq!(first, "The prediction is: 1 with probability of having diabetes: 50.00%.");
        assert_eq!(first, second);
    }

    #[test]
    fn test_answer_with_bad_input_never_reaches_model() {
        let model = FixedClassifier::new(1, 0.5);

        let err = generate_answer("a, b, c, d, e", &model).unwrap_err();

        assert!(matches!(err, AnswerError::Parse(ParseError::InvalidNumber { .. })));
        assert_eq!(model.calls.get(), 0);
    }

    #[test]
    fn test_answer_with_xgboost_model() {
        let model = XgbClassifier::from_json(&fixtures::two_tree_model("5E-1")).unwrap();

        let yes = generate_answer("8.18, 236, 136, 0, 58", &model).unwrap();
        let no = generate_answer("5.63, 150, 93, 0, 48", &model).unwrap();

        // sigmoid(0.9) = 0.7109..., sigmoid(-0.1) = 0.4750...
        assert_eq!(yes, "The prediction is: 1 with probability of having diabetes: 71.09%.");
        assert_eq!(no, "The prediction is: 0 with probability of having diabetes: 47.50%.");
    }
}
