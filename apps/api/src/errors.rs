use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::pipeline::AnalysisError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No resume file uploaded")]
    UploadMissing,

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Model API key is not configured")]
    ConfigurationMissing,

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::UploadMissing => (
                StatusCode::BAD_REQUEST,
                "UPLOAD_MISSING",
                self.to_string(),
            ),
            AppError::InvalidUpload(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_UPLOAD", msg.clone())
            }
            AppError::ConfigurationMissing => {
                tracing::error!("analysis request rejected: no model credential configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIGURATION_MISSING",
                    self.to_string(),
                )
            }
            // Pipeline failures surface the originating stage's message:
            // the operator UI shows it verbatim for diagnostics.
            AppError::Analysis(e) => {
                tracing::error!("analysis failed at stage {}: {e}", e.stage().as_str());
                let code = match e {
                    AnalysisError::Extraction(_) => "EXTRACTION_ERROR",
                    AnalysisError::Invocation(_) => "INVOCATION_ERROR",
                    AnalysisError::Schema(_) => "SCHEMA_ERROR",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, code, e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
