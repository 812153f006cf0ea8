//! Model artifacts
//!
//! The scaler and classifier are opaque to the rest of the crate: the
//! prediction service only sees the [`FeatureScaler`] and [`Classifier`]
//! traits. The bundled implementations are loaded from JSON documents with a
//! `kind` tag, and are checked against [`FEATURES`](crate::features::FEATURES)
//! when loaded.

pub mod classifier;
pub mod scaler;

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::ArtifactError;
use crate::features::N_FEATURES;

pub use classifier::{load_classifier, Classifier, ClassifierArtifact, LinearSvc, LogisticRegression};
pub use scaler::{load_scaler, FeatureScaler, MinMaxScaler, ScalerArtifact, StandardScaler};

/// Read and parse a JSON artifact document
pub(crate) fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Convert a per-feature vector to a fixed-size array, checking length and finiteness
pub(crate) fn feature_array(
    artifact: &'static str,
    name: &str,
    values: &[f64],
) -> Result<[f64; N_FEATURES], ArtifactError> {
    let array: [f64; N_FEATURES] = values.try_into().map_err(|_| {
        ArtifactError::schema(
            artifact,
            format!("{} has {} values, expected {}", name, values.len(), N_FEATURES),
        )
    })?;

    if let Some(idx) = array.iter().position(|v| !v.is_finite()) {
        return Err(ArtifactError::schema(
            artifact,
            format!("{}[{}] is not finite", name, idx),
        ));
    }

    Ok(array)
}
