use serde::Serialize;
use serving_core::{ErrorKind, ModelInfo, PredictionResult};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub is_healthy: bool,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predictions: PredictionResult,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
}

/// Operator-facing view of the registry.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub state: &'static str,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelInfo>,
}
