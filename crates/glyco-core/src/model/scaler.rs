//! Feature scaling transforms

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, InferenceError};
use crate::features::{FEATURES, N_FEATURES};

use super::{feature_array, read_artifact};

/// Scaling transform fitted on the [`FEATURES`] columns
pub trait FeatureScaler: Send + Sync {
    /// Short name of the transform, used in logs and `/status`
    fn kind(&self) -> &'static str;

    /// Scale one row given in [`FEATURES`] order
    fn transform(&self, row: &[f64; N_FEATURES]) -> Result<[f64; N_FEATURES], InferenceError>;
}

/// Scaler artifact document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    /// `(x - mean) / scale`
    Standard {
        feature_names: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    /// `x * scale + min`
    MinMax {
        feature_names: Vec<String>,
        min: Vec<f64>,
        scale: Vec<f64>,
    },
}

impl ScalerArtifact {
    /// Check the document against the feature schema and build the scaler
    pub fn into_scaler(self) -> Result<Box<dyn FeatureScaler>, ArtifactError> {
        match self {
            ScalerArtifact::Standard {
                feature_names,
                mean,
                scale,
            } => {
                check_feature_names(&feature_names)?;
                let scaler = StandardScaler::new(
                    feature_array("scaler", "mean", &mean)?,
                    feature_array("scaler", "scale", &scale)?,
                )?;
                Ok(Box::new(scaler))
            }
            ScalerArtifact::MinMax {
                feature_names,
                min,
                scale,
            } => {
                check_feature_names(&feature_names)?;
                Ok(Box::new(MinMaxScaler {
                    min: feature_array("scaler", "min", &min)?,
                    scale: feature_array("scaler", "scale", &scale)?,
                }))
            }
        }
    }
}

/// Load a scaler artifact from disk
pub fn load_scaler(path: impl AsRef<Path>) -> Result<Box<dyn FeatureScaler>, ArtifactError> {
    let artifact: ScalerArtifact = read_artifact(path.as_ref())?;
    artifact.into_scaler()
}

/// The scaler's columns must be exactly [`FEATURES`], in order.
fn check_feature_names(names: &[String]) -> Result<(), ArtifactError> {
    if names.len() != N_FEATURES {
        return Err(ArtifactError::schema(
            "scaler",
            format!("expected {} feature names, got {}", N_FEATURES, names.len()),
        ));
    }

    for (idx, (actual, expected)) in names.iter().zip(FEATURES.iter()).enumerate() {
        if actual != expected {
            return Err(ArtifactError::schema(
                "scaler",
                format!(
                    "column {} is {:?}, expected {:?}",
                    idx, actual, expected
                ),
            ));
        }
    }

    Ok(())
}

/// Standardization with fitted per-column mean and scale
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: [f64; N_FEATURES],
    scale: [f64; N_FEATURES],
}

impl StandardScaler {
    pub fn new(
        mean: [f64; N_FEATURES],
        scale: [f64; N_FEATURES],
    ) -> Result<Self, ArtifactError> {
        if let Some(idx) = scale.iter().position(|s| *s == 0.0) {
            return Err(ArtifactError::schema(
                "scaler",
                format!("scale for {} is zero", FEATURES[idx]),
            ));
        }
        Ok(Self { mean, scale })
    }
}

impl FeatureScaler for StandardScaler {
    fn kind(&self) -> &'static str {
        "standard"
    }

    fn transform(&self, row: &[f64; N_FEATURES]) -> Result<[f64; N_FEATURES], InferenceError> {
        let mut out = [0.0; N_FEATURES];
        for i in 0..N_FEATURES {
            out[i] = (row[i] - self.mean[i]) / self.scale[i];
        }
        finite(out)
    }
}

/// Min-max scaling with fitted per-column offset and scale
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    min: [f64; N_FEATURES],
    scale: [f64; N_FEATURES],
}

impl MinMaxScaler {
    pub fn new(min: [f64; N_FEATURES], scale: [f64; N_FEATURES]) -> Self {
        Self { min, scale }
    }
}

impl FeatureScaler for MinMaxScaler {
    fn kind(&self) -> &'static str {
        "min_max"
    }

    fn transform(&self, row: &[f64; N_FEATURES]) -> Result<[f64; N_FEATURES], InferenceError> {
        let mut out = [0.0; N_FEATURES];
        for i in 0..N_FEATURES {
            out[i] = row[i] * self.scale[i] + self.min[i];
        }
        finite(out)
    }
}

fn finite(row: [f64; N_FEATURES]) -> Result<[f64; N_FEATURES], InferenceError> {
    match row.iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(InferenceError::NonFiniteScaled(FEATURES[idx])),
        None => Ok(row),
    }
}
