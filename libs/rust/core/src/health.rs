//! Readiness derived from the model registry.

use serde::Serialize;
use std::sync::Arc;

use crate::registry::{ModelRegistry, RegistryState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub ready: bool,
    pub detail: String,
}

/// Read-only view over the registry; checking never changes its state.
#[derive(Clone)]
pub struct HealthMonitor {
    registry: Arc<ModelRegistry>,
}

impl HealthMonitor {
    pub fn new(registry: Arc<ModelRegistry>) -> Self { Self { registry } }

    pub fn check(&self) -> HealthStatus {
        match &*self.registry.state() {
            RegistryState::Loading => HealthStatus { ready: false, detail: "model loading".into() },
            RegistryState::Ready(scorer) => {
                let info = scorer.info();
                HealthStatus { ready: true, detail: format!("{} model ready, {} features", info.format, info.arity) }
            }
            RegistryState::Failed(reason) => HealthStatus { ready: false, detail: format!("model load failed: {reason}") },
        }
    }
}
