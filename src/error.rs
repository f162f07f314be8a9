use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::detection::TranscribeError;

// Taken from https://github.com/tokio-rs/axum/blob/main/examples/anyhow-error-response/src/main.rs
#[derive(Debug)]
pub struct ServiceError {
    pub status: StatusCode,
    pub message: HttpErrorResponse,
}

#[derive(Debug, Serialize)]
pub struct HttpErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

impl HttpErrorResponse {
    pub fn with_kind(kind: &'static str, message: impl Into<String>) -> Self {
        HttpErrorResponse {
            error: message.into(),
            kind,
        }
    }
}

impl From<String> for HttpErrorResponse {
    fn from(message: String) -> Self {
        HttpErrorResponse::with_kind("invalid_request", message)
    }
}

impl From<&str> for HttpErrorResponse {
    fn from(message: &str) -> Self {
        HttpErrorResponse::with_kind("invalid_request", message)
    }
}

impl ServiceError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ServiceError {
            status: StatusCode::BAD_REQUEST,
            message: HttpErrorResponse::with_kind("invalid_request", message),
        }
    }

    pub fn from_transcribe(err: TranscribeError) -> Self {
        let status = match &err {
            TranscribeError::InvalidInput(_) | TranscribeError::NoSpeechDetected => {
                StatusCode::BAD_REQUEST
            }
            TranscribeError::RecognitionFailed { .. } => StatusCode::BAD_GATEWAY,
        };
        ServiceError {
            status,
            message: HttpErrorResponse::with_kind(err.kind(), err.to_string()),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message.error, "Request failed");
        } else {
            tracing::debug!(status = %self.status, error = %self.message.error, "Request rejected");
        }
        let mut res = Json(self.message).into_response();
        *res.status_mut() = self.status;
        res
    }
}

impl<E> From<E> for ServiceError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        ServiceError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: HttpErrorResponse::with_kind("internal", err.into().to_string()),
        }
    }
}

pub type ServiceResult<T, E = ServiceError> = Result<T, E>;

#[macro_export]
macro_rules! bail_service {
    ($status:expr, $error_message:expr) => {
        return Err($crate::error::ServiceError {
            status: $status,
            message: $crate::error::HttpErrorResponse::from($error_message),
        })
    };
    ($status:expr, $fmt:expr $(, $arg:expr)*) => {
        return Err($crate::error::ServiceError {
            status: $status,
            message: $crate::error::HttpErrorResponse::from(format!($fmt $(, $arg)*)),
        })
    };
}
