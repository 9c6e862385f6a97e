use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serving_core::{ErrorKind, RegistryState, ScoringError, ValidationError};
use thiserror::Error;

use crate::api::json_response;
use crate::api::types::{ErrorDetail, ErrorResponse};

/// A request failure, already classified into its client-visible kind.
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Error for a registry that has no scorer to offer.
    pub fn unavailable(state: &RegistryState) -> Self {
        let message = match state {
            RegistryState::Loading => "model is still loading".to_string(),
            RegistryState::Failed(reason) => format!("model failed to load: {reason}"),
            RegistryState::Ready(_) => "model unavailable".to_string(),
        };
        Self::new(ErrorKind::ModelUnavailable, message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self { Self::new(e.kind(), e.to_string()) }
}

impl From<ScoringError> for ApiError {
    fn from(e: ScoringError) -> Self { Self::new(e.kind(), e.to_string()) }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        let kind = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ErrorKind::PayloadTooLarge,
            _ => ErrorKind::MalformedJson,
        };
        Self::new(kind, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        json_response(status, &ErrorResponse { error: ErrorDetail { kind: self.kind, message: self.message } })
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_statuses() {
        assert_eq!(ApiError::new(ErrorKind::MalformedJson, "x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::new(ErrorKind::ScoringFault, "x").status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::unavailable(&RegistryState::Loading).status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError::new(ErrorKind::PayloadTooLarge, "x").status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn validation_errors_keep_their_kind() {
        let err: ApiError = ValidationError::MissingField("instances").into();
        assert_eq!(err.kind, ErrorKind::MissingField);
        assert!(err.message.contains("instances"));
    }

    #[test]
    fn unavailable_message_carries_failure_reason() {
        let err = ApiError::unavailable(&RegistryState::Failed("artifact digest mismatch".into()));
        assert_eq!(err.message, "model failed to load: artifact digest mismatch");
    }
}
