//! Prediction service
//!
//! Owns the scaler and classifier for the lifetime of the process and runs
//! the derive → scale → classify pipeline for one input at a time. The
//! service is immutable once built, so a single instance can be shared across
//! request handlers without locking.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::config::ModelConfig;
use crate::error::{ArtifactError, InferenceError, Result};
use crate::features::{round_to, FeatureVector};
use crate::input::UserInput;
use crate::model::{load_classifier, load_scaler, Classifier, FeatureScaler};

/// Predicted diabetes status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    NotDiabetic,
    Diabetic,
}

impl Outcome {
    /// Map a classifier class to an outcome
    pub fn from_class(class: u8) -> std::result::Result<Self, InferenceError> {
        match class {
            0 => Ok(Outcome::NotDiabetic),
            1 => Ok(Outcome::Diabetic),
            other => Err(InferenceError::UnknownClass(other)),
        }
    }

    pub fn class(&self) -> u8 {
        match self {
            Outcome::NotDiabetic => 0,
            Outcome::Diabetic => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::NotDiabetic => "Not Diabetic",
            Outcome::Diabetic => "Diabetic",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Confidence of a prediction, as a percentage rounded to 2 decimals
///
/// Serialized as a string such as `"87.35%"`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Confidence(f64);

impl Confidence {
    /// Confidence from class probabilities: the largest one, as a percentage
    pub fn from_probabilities(
        probabilities: [f64; 2],
    ) -> std::result::Result<Self, InferenceError> {
        if probabilities
            .iter()
            .any(|p| !p.is_finite() || !(0.0..=1.0).contains(p))
        {
            return Err(InferenceError::InvalidProbabilities(probabilities));
        }
        let max = probabilities[0].max(probabilities[1]);
        Ok(Self(round_to(max * 100.0, 2)))
    }

    pub fn percent(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}

impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of a single prediction
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub outcome: Outcome,
    /// Absent when the classifier has no probability estimates
    pub confidence: Option<Confidence>,
    pub features: FeatureVector,
}

impl PredictionResult {
    pub fn class(&self) -> u8 {
        self.outcome.class()
    }

    pub fn label(&self) -> &'static str {
        self.outcome.label()
    }
}

/// Loaded model pipeline
pub struct PredictionService {
    scaler: Box<dyn FeatureScaler>,
    classifier: Box<dyn Classifier>,
}

impl fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictionService")
            .field("scaler", &self.scaler.kind())
            .field("classifier", &self.classifier.kind())
            .finish()
    }
}

impl PredictionService {
    /// Build a service from already loaded components
    pub fn new(scaler: Box<dyn FeatureScaler>, classifier: Box<dyn Classifier>) -> Self {
        Self { scaler, classifier }
    }

    /// Load both artifacts from disk.
    ///
    /// Any failure here is meant to be fatal for the process.
    pub fn load(config: &ModelConfig) -> std::result::Result<Self, ArtifactError> {
        let classifier = load_classifier(&config.classifier_path)?;
        let scaler = load_scaler(&config.scaler_path)?;

        tracing::info!(
            classifier = classifier.kind(),
            scaler = scaler.kind(),
            probability = classifier.supports_probability(),
            "Loaded model artifacts"
        );

        Ok(Self::new(scaler, classifier))
    }

    pub fn classifier_kind(&self) -> &'static str {
        self.classifier.kind()
    }

    pub fn scaler_kind(&self) -> &'static str {
        self.scaler.kind()
    }

    pub fn supports_probability(&self) -> bool {
        self.classifier.supports_probability()
    }

    /// Run the full pipeline for one validated input
    pub fn predict(&self, input: &UserInput) -> Result<PredictionResult> {
        let features = FeatureVector::derive(input)?;
        tracing::debug!(?features, "Derived feature vector");

        let scaled = self.scaler.transform(&features.to_row())?;
        let outcome = Outcome::from_class(self.classifier.predict(&scaled)?)?;

        let confidence = match self.classifier.predict_proba(&scaled) {
            Ok(probabilities) => Some(Confidence::from_probabilities(probabilities)?),
            Err(InferenceError::ProbabilityUnsupported(_)) => None,
            Err(e) => return Err(e.into()),
        };

        Ok(PredictionResult {
            outcome,
            confidence,
            features,
        })
    }
}
