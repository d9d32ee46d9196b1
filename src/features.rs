//! Feature vector parsing
//!
//! The chat accepts exactly one kind of input: five comma-separated numbers in
//! the order the classifier was trained on.
//!
//! ```
//! use diacheck::features::FeatureVector;
//!
//! let v = FeatureVector::parse("8.18, 236, 136, 0, 58").unwrap();
//! assert_eq!(v.hba1c(), 8.18);
//! assert_eq!(v.age(), 58.0);
//! ```
//!
//! Values are not range-checked: a negative age or an HbA1c of 400 is passed
//! to the model as-is.

use crate::error::ParseError;
use serde::Serialize;

/// Number of features the classifier was trained on
pub const FEATURE_COUNT: usize = 5;

/// Feature order expected by the model artifact
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "hba1c",
    "glucose_postprandial",
    "glucose_fasting",
    "family_history_diabetes",
    "age",
];

/// One row of model input, in [`FEATURE_NAMES`] order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Parse `"a, b, c, d, e"` into a vector
    ///
    /// Every segment is trimmed and must be a finite number. Bad tokens are
    /// reported before a wrong count, so `"abc"` is an invalid number rather
    /// than a count mismatch.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let values = text
            .split(',')
            .enumerate()
            .map(|(i, segment)| parse_value(i + 1, segment.trim()))
            .collect::<Result<Vec<f64>, _>>()?;

        let found = values.len();
        let values: [f64; FEATURE_COUNT] = values.try_into().map_err(|_| ParseError::WrongCount {
            expected: FEATURE_COUNT,
            found,
        })?;

        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn hba1c(&self) -> f64 {
        self.0[0]
    }

    pub fn glucose_postprandial(&self) -> f64 {
        self.0[1]
    }

    pub fn glucose_fasting(&self) -> f64 {
        self.0[2]
    }

    pub fn family_history_diabetes(&self) -> f64 {
        self.0[3]
    }

    pub fn age(&self) -> f64 {
        self.0[4]
    }
}

/// Free-function form of [`FeatureVector::parse`]
pub fn parse(text: &str) -> Result<FeatureVector, ParseError> {
    FeatureVector::parse(text)
}

fn parse_value(position: usize, token: &str) -> Result<f64, ParseError> {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError::InvalidNumber {
            position,
            token: token.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // ACCEPTED INPUT
    // ==========================================================================

    #[test]
    fn test_parse_documented_example() {
        let v = parse("8.18, 236, 136, 0, 58").unwrap();
        assert_eq!(v.as_slice(), &[8.18, 236.0, 136.0, 0.0, 58.0]);
    }

    #[test]
    fn test_parse_without_spaces() {
        let v = parse("5.63,150,93,0,48").unwrap();
        assert_eq!(v, FeatureVector::new([5.63, 150.0, 93.0, 0.0, 48.0]));
    }

    #[test]
    fn test_parse_trims_tabs_and_newlines() {
        let v = parse(" 6.1 ,\t140, 100 ,1 , 33\n").unwrap();
        assert_eq!(v.glucose_postprandial(), 140.0);
        assert_eq!(v.family_history_diabetes(), 1.0);
    }

    #[test]
    fn test_parse_accepts_negative_values() {
        // No range validation: the model gets what the user typed
        let v = parse("5, 100, 90, 0, -4").unwrap();
        assert_eq!(v.age(), -4.0);
    }

    #[test]
    fn test_parse_scientific_notation() {
        let v = parse("8.2e0, 2.36E2, 136, 0, 58").unwrap();
        assert_eq!(v.glucose_postprandial(), 236.0);
    }

    #[test]
    fn test_accessors_follow_feature_order() {
        let v = FeatureVector::new([1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(v.hba1c(), 1.0);
        assert_eq!(v.glucose_postprandial(), 2.0);
        assert_eq!(v.glucose_fasting(), 3.0);
        assert_eq!(v.family_history_diabetes(), 4.0);
        assert_eq!(v.age(), 5.0);
    }

    // ==========================================================================
    // REJECTED INPUT
    // ==========================================================================

    #[test]
    fn test_parse_rejects_letters() {
        let err = parse("a, b, c, d, e").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidNumber {
                position: 1,
                token: "a".to_string()
            }
        );
    }

    #[test]
    fn test_parse_reports_position_of_bad_token() {
        let err = parse("8.18, 236, oops, 0, 58").unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { position: 3, .. }));
    }

    #[test]
    fn test_parse_rejects_too_few_values() {
        let err = parse("1,2").unwrap_err();
        assert_eq!(err, ParseError::WrongCount { expected: 5, found: 2 });
    }

    #[test]
    fn test_parse_rejects_too_many_values() {
        let err = parse("1,2,3,4,5,6").unwrap_err();
        assert_eq!(err, ParseError::WrongCount { expected: 5, found: 6 });
    }

    #[test]
    fn test_parse_rejects_empty_segment() {
        let err = parse("1,,3,4,5").unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { position: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_empty_input() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
    }

    #[test]
    fn test_parse_rejects_non_finite() {
        assert!(parse("nan, 1, 2, 3, 4").is_err());
        assert!(parse("1, inf, 2, 3, 4").is_err());
    }
}
