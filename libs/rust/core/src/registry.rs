//! Write-once owner of the process's single scorer.
//!
//! State starts at `Loading` and moves exactly once, to `Ready` or `Failed`.
//! The transition is published with an atomic pointer swap so readers either
//! see the old state or a fully built scorer, never anything in between.

use arc_swap::ArcSwap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::scorer::{ArtifactError, Scorer};

#[derive(Debug, Clone)]
pub enum RegistryState {
    Loading,
    Ready(Arc<Scorer>),
    Failed(String),
}

impl RegistryState {
    pub fn name(&self) -> &'static str {
        match self {
            RegistryState::Loading => "loading",
            RegistryState::Ready(_) => "ready",
            RegistryState::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry already initialized")]
    AlreadyInitialized,
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("model loader panicked")]
    LoaderPanicked,
}

pub struct ModelRegistry {
    state: ArcSwap<RegistryState>,
    claimed: AtomicBool,
}

impl Default for ModelRegistry {
    fn default() -> Self { Self::new() }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self { state: ArcSwap::from_pointee(RegistryState::Loading), claimed: AtomicBool::new(false) }
    }

    /// Loads the artifact at `path`. Blocks on disk I/O.
    pub fn initialize(&self, path: &Path) -> Result<(), RegistryError> {
        self.initialize_with(|| Scorer::load(path))
    }

    /// Runs `loader` and publishes its outcome. Only the first call on a
    /// registry does anything; later calls fail with `AlreadyInitialized`.
    pub fn initialize_with<F>(&self, loader: F) -> Result<(), RegistryError>
    where
        F: FnOnce() -> Result<Scorer, ArtifactError>,
    {
        if self.claimed.swap(true, Ordering::AcqRel) {
            warn!("ignoring repeated registry initialization");
            return Err(RegistryError::AlreadyInitialized);
        }
        let started = Instant::now();
        let outcome = match catch_unwind(AssertUnwindSafe(loader)) {
            Ok(Ok(scorer)) => Ok(scorer),
            Ok(Err(e)) => Err(RegistryError::Artifact(e)),
            Err(_) => Err(RegistryError::LoaderPanicked),
        };
        match outcome {
            Ok(scorer) => {
                let info = scorer.info();
                info!(format = info.format, arity = info.arity, elapsed_ms = started.elapsed().as_millis() as u64, "model registry ready");
                self.state.store(Arc::new(RegistryState::Ready(Arc::new(scorer))));
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "model load failed; registry will stay unavailable");
                self.state.store(Arc::new(RegistryState::Failed(e.to_string())));
                Err(e)
            }
        }
    }

    /// Runs the load on the blocking pool so the caller can start serving
    /// while the registry is still `Loading`.
    pub fn spawn_initialize<F>(self: &Arc<Self>, loader: F) -> JoinHandle<Result<(), RegistryError>>
    where
        F: FnOnce() -> Result<Scorer, ArtifactError> + Send + 'static,
    {
        let registry = Arc::clone(self);
        tokio::task::spawn_blocking(move || registry.initialize_with(loader))
    }

    /// The scorer, if and only if the registry is `Ready`.
    pub fn current_scorer(&self) -> Option<Arc<Scorer>> {
        match &**self.state.load() {
            RegistryState::Ready(scorer) => Some(Arc::clone(scorer)),
            _ => None,
        }
    }

    pub fn state(&self) -> Arc<RegistryState> { self.state.load_full() }
}
