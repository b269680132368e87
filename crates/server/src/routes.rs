use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use receipt_ocr::{LineItem, ReceiptSummary};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::analyzer::{ReceiptAnalysis, ReceiptAnalyzer};
use crate::error::PredictError;
use crate::upload;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<ReceiptAnalyzer>,
}

/// Body of a successful `POST /predict`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predicted_class: usize,
    pub confidence: f32,
    pub items: Vec<LineItem>,
    pub summary: ReceiptSummary,
}

impl From<ReceiptAnalysis> for PredictResponse {
    fn from(analysis: ReceiptAnalysis) -> Self {
        Self {
            predicted_class: analysis.prediction.predicted_class,
            confidence: analysis.prediction.confidence,
            items: analysis.receipt.items,
            summary: analysis.receipt.summary,
        }
    }
}

pub fn router(analyzer: ReceiptAnalyzer, max_upload_bytes: usize) -> Router {
    let state = AppState { analyzer: Arc::new(analyzer) };

    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, PredictError> {
    // Anything that is not multipart cannot carry a file part.
    let multipart = multipart.map_err(|_| PredictError::NoFilePart)?;
    let upload = upload::read_upload(multipart).await?;
    tracing::info!(file_name = %upload.file_name, bytes = upload.bytes.len(), "Receipt received");

    let analyzer = state.analyzer.clone();
    let analysis = tokio::task::spawn_blocking(move || analyzer.analyze(&upload)).await??;

    Ok(Json(analysis.into()))
}
