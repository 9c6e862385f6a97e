//! HTTP front end for a single in-process model.
//!
//! `run` starts loading the artifact on the blocking pool and begins serving
//! immediately; `/health_check` answers 503 until the registry is ready.

use anyhow::{Context, Result};
use serving_core::{ModelRegistry, Scorer, ServerConfig};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

pub mod api;
pub mod state;

pub use api::create_router;
pub use state::AppState;

pub async fn run(cfg: ServerConfig) -> Result<()> {
    let registry = Arc::new(ModelRegistry::new());

    let path = cfg.model_path.clone();
    let digest = cfg.model_sha256.clone();
    info!(path = %path.display(), "loading model artifact");
    let load = registry.spawn_initialize(move || Scorer::load_verified(&path, digest.as_deref()));
    tokio::spawn(async move {
        // outcome is logged by the registry; only a lost task needs reporting here
        if let Err(e) = load.await { error!(error = %e, "model load task did not complete"); }
    });

    let app = create_router(AppState::new(registry, &cfg));
    let listener = bind(&cfg).await?;
    info!(address = %listener.local_addr()?, "inference-gateway listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("inference-gateway shut down");
    Ok(())
}

/// Binds `host:port`, resolving `host` when it is a name rather than an IP.
pub async fn bind(cfg: &ServerConfig) -> Result<TcpListener> {
    TcpListener::bind((cfg.host.as_str(), cfg.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", cfg.host, cfg.port))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => { sigterm.recv().await; }
            Err(e) => {
                error!(error = %e, "sigterm handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        _ = ctrl_c => "ctrl-c",
        _ = terminate => "sigterm",
    };
    info!(signal = received, "draining in-flight requests");
}
