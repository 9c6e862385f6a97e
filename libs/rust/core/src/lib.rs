//! Core building blocks for the single-model inference server.
//!
//! The crate owns everything below the HTTP layer: the typed request batch,
//! the loaded scorer, the write-once model registry, request validation and
//! readiness reporting. Services link it and add their own transport.

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing::info;
use tracing_subscriber::prelude::*;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

pub mod batch;
pub mod config;
pub mod error;
pub mod health;
pub mod registry;
pub mod scorer;
pub mod validator;

pub use batch::{FeatureVector, Prediction, PredictionBatch, PredictionResult, ShapeError};
pub use config::{load_config, ServerConfig};
pub use error::ErrorKind;
pub use health::{HealthMonitor, HealthStatus};
pub use registry::{ModelRegistry, RegistryError, RegistryState};
pub use scorer::{ArtifactError, Model, ModelInfo, Scorer, ScoringError};
pub use validator::{parse, ValidationError};

/// Installs the global tracing subscriber. Safe to call more than once; only
/// the first call has an effect.
///
/// `RUST_LOG` drives filtering (defaults to `info`); `SERVE_JSON_LOG=1` switches
/// to flattened JSON records for log shippers.
pub fn init_tracing(service: &str) -> Result<()> {
    TRACING_INIT.get_or_try_init(|| -> Result<()> {
        let json = std::env::var("SERVE_JSON_LOG").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        let fmt_layer = if json {
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_line_number(true)
                .boxed()
        };
        tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init()?;
        Ok(())
    })?;
    info!(target: "serving_core", service, "tracing initialized");
    Ok(())
}
