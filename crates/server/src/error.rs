use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analyzer::AnalyzeError;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("No file part")]
    NoFilePart,
    #[error("No selected file")]
    NoSelectedFile,
    #[error("{}", .0.body_text())]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Analyze(#[from] AnalyzeError),
    #[error("Request worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl PredictError {
    pub fn status(&self) -> StatusCode {
        match self {
            PredictError::NoFilePart | PredictError::NoSelectedFile => StatusCode::BAD_REQUEST,
            PredictError::Multipart(e) => e.status(),
            PredictError::Analyze(_) | PredictError::Worker(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.to_string();
        tracing::error!(status = status.as_u16(), "{error}");
        (status, Json(ErrorBody { error })).into_response()
    }
}
