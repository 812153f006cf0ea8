//! Glyco Core - diabetes risk prediction
//!
//! This crate provides the domain logic behind the glyco prediction API:
//!
//! - **Input**: Patient biometrics schema with per-field validation
//! - **Features**: Derivation of the 8-column model input (BMI, pedigree score, ...)
//! - **Model**: Scaler and classifier contracts plus JSON artifact loaders
//! - **Service**: The derive → scale → classify pipeline
//! - **Config**: Server and artifact configuration (defaults, TOML, environment)
//!
//! # Pipeline
//!
//! ```text
//! JSON body → UserInput → FeatureVector → scaled row → class + probabilities
//! ```
//!
//! The column order between [`FeatureVector`] and the fitted scaler is fixed
//! by [`FEATURES`] and checked when the scaler artifact is loaded.

pub mod config;
pub mod error;
pub mod features;
pub mod input;
pub mod model;
pub mod service;

pub use config::{GlycoConfig, ModelConfig, ServerConfig};
pub use error::{
    ArtifactError, ConfigError, FieldError, GlycoError, InferenceError, PreprocessingError,
    Result, ValidationErrors,
};
pub use features::{FeatureVector, FEATURES, N_FEATURES};
pub use input::{Gender, UserInput};
pub use model::{Classifier, FeatureScaler};
pub use service::{Confidence, Outcome, PredictionResult, PredictionService};

/// Returns the version of glyco-core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
