//! Test fixture helpers

use std::path::{Path, PathBuf};

use glyco_core::FEATURES;
use serde_json::{json, Value};

/// Path to an artifact shipped in the workspace `ml_model/` directory
pub fn shipped_artifact(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("ml_model")
        .join(name)
}

/// Standard scaler document with zero mean and unit scale
pub fn identity_scaler() -> Value {
    json!({
        "kind": "standard",
        "feature_names": FEATURES,
        "mean": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        "scale": [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]
    })
}

/// Logistic regression document
pub fn logistic(coefficients: [f64; 8], intercept: f64) -> Value {
    json!({
        "kind": "logistic_regression",
        "coefficients": coefficients,
        "intercept": intercept
    })
}

/// Write a JSON document into `dir` and return its path
pub fn write_artifact(dir: &Path, name: &str, document: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(document).unwrap())
        .unwrap_or_else(|_| panic!("Failed to write fixture: {}", name));
    path
}
