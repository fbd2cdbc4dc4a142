use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::ocr::fetch::FetchError;
use crate::ocr::OcrError;

/// Transport-level failures. These never become a `Verdict`; a verdict is
/// only produced once there is text to scan.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid image url: {0}")]
    InvalidUrl(String),

    #[error("image resource not found (upstream status {0})")]
    ImageNotFound(u16),

    #[error("image download failed: {0}")]
    Download(String),

    #[error("image too large")]
    ImageTooLarge,

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("ocr failed: {0}")]
    Ocr(String),

    #[error("rate limit exceeded")]
    RateLimitExceeded { retry_after: u64 },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::InvalidUrl(msg) => AppError::InvalidUrl(msg),
            FetchError::NotFound(status) => AppError::ImageNotFound(status),
            FetchError::TooLarge { .. } => AppError::ImageTooLarge,
            FetchError::Transport(msg) => AppError::Download(msg),
        }
    }
}

impl From<OcrError> for AppError {
    fn from(e: OcrError) -> Self {
        match e {
            OcrError::UnsupportedImage => AppError::InvalidImage(e.to_string()),
            other => AppError::Ocr(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::InvalidUrl(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "invalid_url",
                "Invalid Image URL provided.".to_string(),
            ),
            AppError::ImageNotFound(_) => (
                StatusCode::GONE,
                "invalid_request_error",
                "image_not_found",
                "Image resource not found.".to_string(),
            ),
            AppError::Download(e) => {
                tracing::warn!("image download failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "download_failed",
                    "image could not be downloaded".to_string(),
                )
            }
            AppError::ImageTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "invalid_request_error",
                "image_too_large",
                "image exceeds size limit".to_string(),
            ),
            AppError::InvalidImage(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_request_error",
                "invalid_image",
                "Image could not be opened, it is not a supported image format.".to_string(),
            ),
            AppError::RateLimitExceeded { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limit_error",
                "rate_limit_exceeded",
                "rate limit exceeded".to_string(),
            ),
            AppError::Ocr(e) => {
                tracing::error!("OCR error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "ocr_failed",
                    "text could not be read from the image".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        let mut response = (status, body).into_response();

        if let AppError::RateLimitExceeded { retry_after } = self {
            if let Ok(value) = axum::http::HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert("retry-after", value);
            }
        }

        response
    }
}
