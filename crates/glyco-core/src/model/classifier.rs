//! Binary classifiers over scaled features

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, InferenceError};
use crate::features::N_FEATURES;

use super::{feature_array, read_artifact};

/// Default decision threshold on the positive-class probability
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Binary classifier over one scaled feature row
pub trait Classifier: Send + Sync {
    /// Short name of the model, used in logs and `/status`
    fn kind(&self) -> &'static str;

    /// Predicted class, 0 or 1
    fn predict(&self, row: &[f64; N_FEATURES]) -> Result<u8, InferenceError>;

    /// Class probabilities `[p(0), p(1)]`.
    ///
    /// Models without probability estimates return
    /// [`InferenceError::ProbabilityUnsupported`].
    fn predict_proba(&self, row: &[f64; N_FEATURES]) -> Result<[f64; 2], InferenceError>;

    /// Whether [`predict_proba`](Classifier::predict_proba) is available
    fn supports_probability(&self) -> bool {
        true
    }
}

/// Classifier artifact document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    LogisticRegression {
        coefficients: Vec<f64>,
        intercept: f64,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    LinearSvc {
        coefficients: Vec<f64>,
        intercept: f64,
    },
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl ClassifierArtifact {
    /// Check the document against the feature schema and build the classifier
    pub fn into_classifier(self) -> Result<Box<dyn Classifier>, ArtifactError> {
        match self {
            ClassifierArtifact::LogisticRegression {
                coefficients,
                intercept,
                threshold,
            } => {
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(ArtifactError::schema(
                        "classifier",
                        format!("threshold {} is outside [0, 1]", threshold),
                    ));
                }
                Ok(Box::new(LogisticRegression {
                    coefficients: feature_array("classifier", "coefficients", &coefficients)?,
                    intercept: finite_intercept(intercept)?,
                    threshold,
                }))
            }
            ClassifierArtifact::LinearSvc {
                coefficients,
                intercept,
            } => Ok(Box::new(LinearSvc {
                coefficients: feature_array("classifier", "coefficients", &coefficients)?,
                intercept: finite_intercept(intercept)?,
            })),
        }
    }
}

/// Load a classifier artifact from disk
pub fn load_classifier(path: impl AsRef<Path>) -> Result<Box<dyn Classifier>, ArtifactError> {
    let artifact: ClassifierArtifact = read_artifact(path.as_ref())?;
    artifact.into_classifier()
}

fn finite_intercept(intercept: f64) -> Result<f64, ArtifactError> {
    if intercept.is_finite() {
        Ok(intercept)
    } else {
        Err(ArtifactError::schema("classifier", "intercept is not finite"))
    }
}

fn decision_function(
    coefficients: &[f64; N_FEATURES],
    intercept: f64,
    row: &[f64; N_FEATURES],
) -> Result<f64, InferenceError> {
    let score = coefficients
        .iter()
        .zip(row.iter())
        .map(|(w, x)| w * x)
        .sum::<f64>()
        + intercept;
    if score.is_finite() {
        Ok(score)
    } else {
        Err(InferenceError::NonFiniteScore)
    }
}

/// Logistic regression with a probability threshold
///
/// Class 1 needs a positive-class probability strictly above the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    coefficients: [f64; N_FEATURES],
    intercept: f64,
    threshold: f64,
}

impl LogisticRegression {
    pub fn new(coefficients: [f64; N_FEATURES], intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

impl Classifier for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn predict(&self, row: &[f64; N_FEATURES]) -> Result<u8, InferenceError> {
        let [_, positive] = self.predict_proba(row)?;
        // Strict, so a zero decision function is the negative class
        Ok(u8::from(positive > self.threshold))
    }

    fn predict_proba(&self, row: &[f64; N_FEATURES]) -> Result<[f64; 2], InferenceError> {
        let score = decision_function(&self.coefficients, self.intercept, row)?;
        let positive = 1.0 / (1.0 + (-score).exp());
        Ok([1.0 - positive, positive])
    }
}

/// Linear support vector classifier, sign of the decision function
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSvc {
    coefficients: [f64; N_FEATURES],
    intercept: f64,
}

impl LinearSvc {
    pub fn new(coefficients: [f64; N_FEATURES], intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }
}

impl Classifier for LinearSvc {
    fn kind(&self) -> &'static str {
        "linear_svc"
    }

    fn predict(&self, row: &[f64; N_FEATURES]) -> Result<u8, InferenceError> {
        let score = decision_function(&self.coefficients, self.intercept, row)?;
        Ok(u8::from(score > 0.0))
    }

    fn predict_proba(&self, _row: &[f64; N_FEATURES]) -> Result<[f64; 2], InferenceError> {
        Err(InferenceError::ProbabilityUnsupported(self.kind()))
    }

    fn supports_probability(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_logistic_probabilities_sum_to_one() {
        let model = LogisticRegression::new([0.5; N_FEATURES], -1.0);
        let [neg, pos] = model.predict_proba(&[0.25; N_FEATURES]).unwrap();
        assert!((neg + pos - 1.0).abs() < 1e-12);
        // score = 8 * 0.125 - 1 = 0
        assert!((pos - 0.5).abs() < 1e-12);
        assert_eq!(model.predict(&[0.25; N_FEATURES]).unwrap(), 0);
    }

    #[test]
    fn test_logistic_zero_score_is_negative() {
        let model = LogisticRegression::new([0.0; N_FEATURES], 0.0);
        assert_eq!(model.predict_proba(&[3.0; N_FEATURES]).unwrap(), [0.5, 0.5]);
        assert_eq!(model.predict(&[3.0; N_FEATURES]).unwrap(), 0);

        let nudged = LogisticRegression::new([0.0; N_FEATURES], 1e-9);
        assert_eq!(nudged.predict(&[3.0; N_FEATURES]).unwrap(), 1);
    }

    #[test]
    fn test_logistic_threshold() {
        let model = LogisticRegression::new([1.0; N_FEATURES], 0.0).with_threshold(0.9);
        let row = [0.1; N_FEATURES];
        // sigmoid(0.8) ~ 0.69
        assert_eq!(model.predict(&row).unwrap(), 0);
    }

    #[test]
    fn test_linear_svc_has_no_probabilities() {
        let model = LinearSvc::new([1.0; N_FEATURES], -1.0);
        assert!(!model.supports_probability());
        assert_eq!(model.predict(&[1.0; N_FEATURES]).unwrap(), 1);
        assert_eq!(model.predict(&[0.0; N_FEATURES]).unwrap(), 0);
        assert_eq!(
            model.predict_proba(&[1.0; N_FEATURES]),
            Err(InferenceError::ProbabilityUnsupported("linear_svc"))
        );
    }

    #[test]
    fn test_non_finite_score() {
        let model = LinearSvc::new([f64::MAX; N_FEATURES], 0.0);
        assert_eq!(
            model.predict(&[f64::MAX; N_FEATURES]),
            Err(InferenceError::NonFiniteScore)
        );
    }

    #[test]
    fn test_artifact_default_threshold() {
        let artifact: ClassifierArtifact = serde_json::from_value(json!({
            "kind": "logistic_regression",
            "coefficients": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            "intercept": 0.0
        }))
        .unwrap();
        match &artifact {
            ClassifierArtifact::LogisticRegression { threshold, .. } => {
                assert_eq!(*threshold, DEFAULT_THRESHOLD)
            }
            other => panic!("unexpected artifact {:?}", other),
        }
        assert_eq!(artifact.into_classifier().unwrap().kind(), "logistic_regression");
    }

    #[test]
    fn test_artifact_rejects_bad_threshold() {
        let artifact = ClassifierArtifact::LogisticRegression {
            coefficients: vec![0.0; 8],
            intercept: 0.0,
            threshold: 1.5,
        };
        assert!(matches!(
            artifact.into_classifier(),
            Err(ArtifactError::Schema { .. })
        ));
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let result: Result<ClassifierArtifact, _> = serde_json::from_value(json!({
            "kind": "random_forest",
            "trees": []
        }));
        assert!(result.is_err());
    }
}
