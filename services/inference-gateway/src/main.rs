use anyhow::Result;
use serving_core::{init_tracing, load_config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("inference-gateway")?;
    let cfg = load_config()?;
    info!(target: "inference-gateway", ?cfg, "Starting inference-gateway service");
    inference_gateway::run(cfg).await
}
