//! Shared helpers for driving the router without a socket

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use glyco_core::model::{LinearSvc, LogisticRegression, StandardScaler};
use glyco_core::{Classifier, InferenceError, PredictionService, N_FEATURES};
use glyco_server::{create_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

/// Scaler that passes rows through unchanged
fn identity_scaler() -> Box<StandardScaler> {
    Box::new(StandardScaler::new([0.0; N_FEATURES], [1.0; N_FEATURES]).unwrap())
}

/// Logistic model driven by glucose only: p(1) = sigmoid(0.05 * (glucose - 140))
pub fn glucose_service() -> PredictionService {
    let mut coefficients = [0.0; N_FEATURES];
    coefficients[1] = 0.05;
    PredictionService::new(
        identity_scaler(),
        Box::new(LogisticRegression::new(coefficients, -7.0)),
    )
}

/// Linear SVC without probability estimates
pub fn svc_service() -> PredictionService {
    let mut coefficients = [0.0; N_FEATURES];
    coefficients[1] = 1.0;
    PredictionService::new(identity_scaler(), Box::new(LinearSvc::new(coefficients, -140.0)))
}

/// Classifier whose decision function always overflows
struct Broken;

impl Classifier for Broken {
    fn kind(&self) -> &'static str {
        "broken"
    }

    fn predict(&self, _row: &[f64; N_FEATURES]) -> Result<u8, InferenceError> {
        Err(InferenceError::NonFiniteScore)
    }

    fn predict_proba(&self, _row: &[f64; N_FEATURES]) -> Result<[f64; 2], InferenceError> {
        Err(InferenceError::NonFiniteScore)
    }
}

pub fn broken_service() -> PredictionService {
    PredictionService::new(identity_scaler(), Box::new(Broken))
}

pub fn ready_app(service: PredictionService) -> Router {
    create_router(Arc::new(AppState::ready(service)), CorsLayer::permissive())
}

pub fn request_body() -> Value {
    json!({
        "Gender": "male",
        "Glucose": 120,
        "BloodPressure": 70,
        "SkinThickness": 20,
        "Insulin": 80,
        "Age": 45,
        "Weight": 80,
        "Height": 1.8,
        "Pregnancies": 3,
        "FamilyParents": 1,
        "FamilyGrandparents": 2
    })
}

/// POST a raw body to the prediction endpoint
pub async fn post_raw(app: Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/diabetes_prediction")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, body: &Value) -> (StatusCode, Value) {
    post_raw(app, &body.to_string()).await
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}
