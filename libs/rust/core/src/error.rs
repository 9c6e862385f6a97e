//! Client-visible failure kinds and their status codes.

use serde::Serialize;
use std::fmt;

/// Every failure a `/predict` caller can observe. Each kind maps to exactly
/// one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "MalformedJSON")]
    MalformedJson,
    MissingField,
    ShapeError,
    ArityMismatch,
    /// Body exceeded the configured `max_body_bytes`.
    PayloadTooLarge,
    ScoringFault,
    ModelUnavailable,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MalformedJson => "MalformedJSON",
            ErrorKind::MissingField => "MissingField",
            ErrorKind::ShapeError => "ShapeError",
            ErrorKind::ArityMismatch => "ArityMismatch",
            ErrorKind::PayloadTooLarge => "PayloadTooLarge",
            ErrorKind::ScoringFault => "ScoringFault",
            ErrorKind::ModelUnavailable => "ModelUnavailable",
        }
    }

    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::MalformedJson | ErrorKind::MissingField | ErrorKind::ShapeError | ErrorKind::ArityMismatch => 400,
            ErrorKind::PayloadTooLarge => 413,
            ErrorKind::ScoringFault => 500,
            ErrorKind::ModelUnavailable => 503,
        }
    }

    /// Caused by the request rather than by the server.
    pub fn is_client_error(self) -> bool { self.status_code() < 500 }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}
