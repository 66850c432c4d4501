//! Error types for configuration, model loading/inference and the HTTP layer

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

use crate::models::ErrorResponse;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),

    #[error("unsupported model format for {0} (expected .json or .onnx)")]
    UnsupportedFormat(String),

    #[error("ONNX model error: {0}")]
    Onnx(String),

    #[error("features[{index}] = {value} is outside the model's f32 input range")]
    InputOutOfRange { index: usize, value: f64 },

    #[error("feature vector has {actual} values, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors returned by request handlers. Rendered as `{"error": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Inference(#[from] ModelError),

    #[error("{0}")]
    Internal(String),

    #[error("Endpoint not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Inference(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Some(context) = self.log_context() {
            error!("{}: {}", context, self);
        }
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse::new(self.to_string()))
    }
}

impl ApiError {
    /// Server-side faults are logged with a prefix naming where they came from.
    fn log_context(&self) -> Option<&'static str> {
        match self {
            ApiError::Inference(_) => Some("Model invocation failed"),
            ApiError::Internal(_) => Some("Internal server error"),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_400() {
        let err = ApiError::BadRequest("missing field `features`".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn model_errors_map_to_500() {
        let err = ApiError::from(ModelError::DimensionMismatch { expected: 5, actual: 3 });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "feature vector has 3 values, model expects 5");
    }

    #[test]
    fn server_faults_are_logged_with_their_own_context() {
        let model = ApiError::from(ModelError::Onnx("bad graph".into()));
        let pool = ApiError::Internal("inference task failed: canceled".into());
        assert_eq!(model.log_context(), Some("Model invocation failed"));
        assert_eq!(pool.log_context(), Some("Internal server error"));
        assert_eq!(pool.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::BadRequest("x".into()).log_context(), None);
        assert_eq!(ApiError::NotFound.log_context(), None);
    }

    #[test]
    fn routing_errors_keep_their_status() {
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::MethodNotAllowed.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
