//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use glyco_core::{
    Confidence, FieldError, GlycoError, PreprocessingError, UserInput, ValidationErrors, FEATURES,
};

use crate::{AppState, Lifecycle};

/// Liveness message returned by `GET /`
pub const ROOT_MESSAGE: &str = "Diabetes Risk Predictor API is running 🚀";

/// Response for a successful prediction
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub status: &'static str,
    pub prediction: u8,
    pub message: &'static str,
    /// `null` when the classifier has no probability estimates
    pub confidence: Option<Confidence>,
}

/// Response for the status endpoint
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub state: &'static str,
    pub features: [&'static str; 8],
    pub classifier: Option<&'static str>,
    pub scaler: Option<&'static str>,
    pub probability: Option<bool>,
}

/// Errors returned to API clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// Artifacts are still loading
    #[error("Service is initializing")]
    NotReady,

    /// Request body failed validation
    #[error("{0}")]
    Validation(ValidationErrors),

    /// Feature derivation failed
    #[error("{0}")]
    Preprocessing(PreprocessingError),

    /// Anything the client should not see the details of
    #[error("Internal server error")]
    Internal,
}

impl From<GlycoError> for ApiError {
    fn from(err: GlycoError) -> Self {
        match err {
            GlycoError::Validation(errors) => ApiError::Validation(errors),
            GlycoError::Preprocessing(e) => {
                tracing::warn!("Preprocessing failed: {}", e);
                ApiError::Preprocessing(e)
            }
            other => {
                tracing::error!("Prediction failed: {}", other);
                ApiError::Internal
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(FieldError::body("json_invalid", rejection.body_text()).into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::NotReady => (
                StatusCode::SERVICE_UNAVAILABLE,
                Value::String(self.to_string()),
            ),
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::to_value(&errors.errors).unwrap_or_default(),
            ),
            ApiError::Preprocessing(_) => (StatusCode::BAD_REQUEST, Value::String(self.to_string())),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Value::String(self.to_string()),
            ),
        };

        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

/// Liveness check
pub async fn root() -> Json<Value> {
    Json(serde_json::json!({ "message": ROOT_MESSAGE }))
}

/// Readiness and model summary
pub async fn get_status(State(state): State<Arc<AppState>>) -> (StatusCode, Json<StatusResponse>) {
    let lifecycle = state.lifecycle();
    let service = state.service();

    let status = match lifecycle {
        Lifecycle::Ready => StatusCode::OK,
        Lifecycle::Initializing => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        status,
        Json(StatusResponse {
            state: lifecycle.as_str(),
            features: FEATURES,
            classifier: service.map(|s| s.classifier_kind()),
            scaler: service.map(|s| s.scaler_kind()),
            probability: service.map(|s| s.supports_probability()),
        }),
    )
}

/// Predict diabetes risk for one patient
pub async fn diabetes_prediction(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let service = state.service().ok_or(ApiError::NotReady)?;

    let Json(body) = body?;
    let input = UserInput::from_json(&body).map_err(ApiError::Validation)?;

    let result = service.predict(&input)?;
    tracing::info!(
        prediction = result.class(),
        confidence = ?result.confidence.map(|c| c.percent()),
        "Prediction served"
    );

    Ok(Json(PredictionResponse {
        status: "success",
        prediction: result.class(),
        message: result.label(),
        confidence: result.confidence,
    }))
}
