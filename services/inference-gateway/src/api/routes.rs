use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serving_core::{validator, ErrorKind, PredictionBatch, PredictionResult, RegistryState};
use tracing::{debug, error, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::json_response;
use crate::api::types::{HealthResponse, PredictResponse, StatusResponse};
use crate::state::AppState;

/// Readiness probe: 200 once a model is loaded, 503 otherwise.
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Response {
    let status = state.health.check();
    debug!(ready = status.ready, detail = %status.detail, "health check");
    let code = if status.ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    json_response(code, &HealthResponse { is_healthy: status.ready })
}

#[instrument(skip(state))]
pub async fn status(State(state): State<AppState>) -> Response {
    let registry_state = state.registry.state();
    let health = state.health.check();
    let model = match &*registry_state {
        RegistryState::Ready(scorer) => Some(scorer.info().clone()),
        _ => None,
    };
    json_response(StatusCode::OK, &StatusResponse { state: registry_state.name(), detail: health.detail, model })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Received,
    Parsed,
    Scored,
}

/// Scratch data for one `/predict` call. Dropped once the response is built.
struct RequestContext {
    stage: Stage,
    body: Bytes,
    rows: usize,
}

#[instrument(skip(state, body))]
pub async fn predict(State(state): State<AppState>, body: Result<Bytes, BytesRejection>) -> Response {
    let (stage, rows, outcome) = match body {
        Ok(body) => {
            let mut ctx = RequestContext { stage: Stage::Received, body, rows: 0 };
            let outcome = score_request(&state, &mut ctx).await;
            (ctx.stage, ctx.rows, outcome)
        }
        // body never arrived in full, usually the size limit
        Err(rejection) => (Stage::Received, 0, Err(ApiError::from(rejection))),
    };
    match outcome {
        Ok(predictions) => {
            debug!(rows, "prediction served");
            json_response(StatusCode::OK, &PredictResponse { predictions })
        }
        Err(e) => {
            if e.kind.is_client_error() {
                warn!(route = "/predict", ?stage, kind = %e.kind, message = %e.message, "prediction rejected");
            } else {
                error!(route = "/predict", ?stage, rows, kind = %e.kind, message = %e.message, "prediction failed");
            }
            e.into_response()
        }
    }
}

async fn score_request(state: &AppState, ctx: &mut RequestContext) -> ApiResult<PredictionResult> {
    let batch: PredictionBatch = validator::parse(&ctx.body)?;
    ctx.stage = Stage::Parsed;
    ctx.rows = batch.len();

    let scorer = match state.registry.current_scorer() {
        Some(scorer) => scorer,
        None => return Err(ApiError::unavailable(&state.registry.state())),
    };

    // scoring is CPU bound; keep it off the I/O workers
    let task = tokio::task::spawn_blocking(move || scorer.score(&batch));
    let joined = match state.score_timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| ApiError::new(ErrorKind::ScoringFault, format!("scoring exceeded {} ms", limit.as_millis())))?,
        None => task.await,
    };
    let predictions = joined
        .map_err(|e| {
            let message = if e.is_panic() { "model panicked during scoring" } else { "scoring task was cancelled" };
            ApiError::new(ErrorKind::ScoringFault, message)
        })??;
    ctx.stage = Stage::Scored;
    Ok(predictions)
}
