//! Error types for glyco-core

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for glyco operations
pub type Result<T> = std::result::Result<T, GlycoError>;

/// Main error type for glyco operations
#[derive(Error, Debug)]
pub enum GlycoError {
    /// Request body failed schema validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// Feature derivation failed
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),

    /// Scaler or classifier invocation failed
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    /// Model artifact could not be loaded
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Configuration is invalid
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// A single rejected field of a request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// Location of the offending value, e.g. `["body", "Glucose"]`
    pub loc: Vec<String>,
    /// Human readable message
    pub msg: String,
    /// Machine readable error kind
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    /// Error for a named body field
    pub fn field(name: &str, kind: &str, msg: impl Into<String>) -> Self {
        Self {
            loc: vec!["body".to_string(), name.to_string()],
            msg: msg.into(),
            kind: kind.to_string(),
        }
    }

    /// Error for the body as a whole
    pub fn body(kind: &str, msg: impl Into<String>) -> Self {
        Self {
            loc: vec!["body".to_string()],
            msg: msg.into(),
            kind: kind.to_string(),
        }
    }
}

/// Every field error collected while validating one request
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Names of the fields that were rejected, in the order they were checked
    pub fn fields(&self) -> Vec<&str> {
        self.errors
            .iter()
            .filter_map(|e| e.loc.get(1).map(String::as_str))
            .collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.loc.join("."), e.msg))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

/// Feature derivation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreprocessingError {
    /// An intermediate value was NaN or infinite
    #[error("Preprocessing error: {feature} is not a finite number ({value})")]
    NonFinite { feature: &'static str, value: f64 },

    /// Height must be strictly positive
    #[error("Preprocessing error: height must be positive, got {0}")]
    NonPositiveHeight(f64),
}

/// Scaler and classifier errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// The classifier cannot estimate class probabilities
    #[error("Classifier {0} does not support probability estimates")]
    ProbabilityUnsupported(&'static str),

    /// The scaler produced a NaN or infinite value
    #[error("Scaler produced a non-finite value for {0}")]
    NonFiniteScaled(&'static str),

    /// The classifier produced a NaN or infinite score
    #[error("Classifier produced a non-finite score")]
    NonFiniteScore,

    /// The classifier returned a class outside {0, 1}
    #[error("Classifier returned unknown class {0}")]
    UnknownClass(u8),

    /// The classifier returned probabilities outside [0, 1]
    #[error("Classifier returned invalid probabilities {0:?}")]
    InvalidProbabilities([f64; 2]),
}

/// Artifact loading errors
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not a valid artifact document
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Artifact does not match the FEATURES schema
    #[error("Schema mismatch in {artifact}: {reason}")]
    Schema {
        artifact: &'static str,
        reason: String,
    },
}

impl ArtifactError {
    pub fn schema(artifact: &'static str, reason: impl Into<String>) -> Self {
        ArtifactError::Schema {
            artifact,
            reason: reason.into(),
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value is invalid
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
