//! HTTP boundary for the emotion prediction service.
//!
//! A single POST /predict endpoint takes `{"text": "..."}` and returns
//! `{"top_emotions": [["happy"]]}` — one label list per input sample, kept
//! as a list of lists for batch compatibility. Every failure surfaces as
//! a 400 with `{"error": "..."}`.

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info};

use anyhow::Context;

use crate::classifier::EmotionClassifier;
use crate::labels::EMOTION_CLASSES;
use crate::selector;

/// Shared state for the prediction server
#[derive(Clone)]
pub struct AppState {
    /// ONNX session runs take `&mut self`, hence the mutex
    pub classifier: Arc<Mutex<EmotionClassifier>>,
    /// Calibrated per-class thresholds, read-only after startup
    pub thresholds: Arc<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub top_emotions: Vec<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Build the router with CORS for cross-origin requests
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict_handler))
        .route("/health", get(health_endpoint))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Serve until ctrl-c
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Emotion service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("Received Ctrl+C, shutting down");
}

/// Simple health endpoint for quick checks
async fn health_endpoint(State(state): State<AppState>) -> Json<serde_json::Value> {
    let healthy = state.classifier.lock().is_ok();
    Json(serde_json::json!({
        "status": if healthy { "ok" } else { "degraded" },
        "classes": EMOTION_CLASSES.len(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Main prediction handler
async fn predict_handler(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(req) = payload.map_err(|rejection| bad_request(rejection.body_text()))?;

    if req.text.trim().is_empty() {
        return Err(bad_request("Field 'text' must not be empty".to_string()));
    }
    debug!("Predicting emotions for {} chars of text", req.text.len());

    let rows = {
        let mut classifier = state
            .classifier
            .lock()
            .map_err(|_| bad_request("Classifier unavailable".to_string()))?;
        classifier.predict(std::slice::from_ref(&req.text))
    }
    .map_err(|e| {
        error!("Inference failed: {}", e);
        bad_request(e.to_string())
    })?;

    let top_emotions = selector::select_batch(&rows, &state.thresholds, &EMOTION_CLASSES)
        .map_err(|e| {
            error!("Label selection failed: {}", e);
            bad_request(e.to_string())
        })?;

    debug!("Selected emotions: {:?}", top_emotions);
    Ok(Json(PredictResponse { top_emotions }))
}

fn bad_request(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message }))
}


// Route-level tests run against the stub classifier, which boots without
// model assets
#[cfg(all(test, not(feature = "onnx")))]
mod route_tests {
    use super::*;
    use crate::classifier::ClassifierConfig;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let classifier = EmotionClassifier::new(ClassifierConfig::default()).unwrap();
        build_router(AppState {
            classifier: Arc::new(Mutex::new(classifier)),
            thresholds: Arc::new(vec![0.5; EMOTION_CLASSES.len()]),
        })
    }

    #[tokio::test]
    async fn test_health_ok() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["classes"], 8);
    }

    #[tokio::test]
    async fn test_predict_malformed_json_is_400() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/predict")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.error.is_empty());
    }

    #[tokio::test]
    async fn test_predict_empty_text_is_400() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/predict")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"text": "   "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.error.contains("must not be empty"));
    }

    #[tokio::test]
    async fn test_predict_without_model_reports_error() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/predict")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"text": "I feel great"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        // Stub classifier has no model; the boundary degrades it to a 400
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
