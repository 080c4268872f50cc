use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Recognition service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Recognition model missing: {0}")]
    ModelMissing(String),

    #[error("Recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("Input rejected: {0}")]
    InputRejected(String),

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ServiceUnavailable(_) => "service_unavailable",
            AppError::ModelMissing(_) => "model_missing",
            AppError::RecognitionFailed(_) => "recognition_failed",
            AppError::InputRejected(_) => "input_rejected",
            AppError::NotFound => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Config(_) => "config",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind().to_string();
        let (status, error_message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::InputRejected(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::ServiceUnavailable(msg) | AppError::ModelMissing(msg) => {
                warn!("recognition service not ready: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
            AppError::RecognitionFailed(msg) => {
                error!("recognition error: {}", msg);
                (StatusCode::BAD_GATEWAY, format!("Error processing image: {}", msg))
            }
            AppError::Config(msg) => {
                error!("configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            kind,
            message: error_message,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::ServiceUnavailable("down".to_string()), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::ModelMissing("llava".to_string()), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::RecognitionFailed("boom".to_string()), StatusCode::BAD_GATEWAY),
            (AppError::InputRejected("empty".to_string()), StatusCode::BAD_REQUEST),
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::Conflict("busy".to_string()), StatusCode::CONFLICT),
            (AppError::Config("bad".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            let kind = error.kind();
            assert_eq!(error.into_response().status(), status, "{}", kind);
        }
    }
}
