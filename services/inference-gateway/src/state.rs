use serving_core::{HealthMonitor, ModelRegistry, ServerConfig};
use std::sync::Arc;
use std::time::Duration;

/// Shared state handed to every request handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub health: HealthMonitor,
    /// Upper bound on one request's scoring time, if configured.
    pub score_timeout: Option<Duration>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(registry: Arc<ModelRegistry>, cfg: &ServerConfig) -> Self {
        Self {
            health: HealthMonitor::new(registry.clone()),
            registry,
            score_timeout: cfg.score_timeout_ms.map(Duration::from_millis),
            max_body_bytes: usize::try_from(cfg.max_body_bytes).unwrap_or(usize::MAX),
        }
    }
}
