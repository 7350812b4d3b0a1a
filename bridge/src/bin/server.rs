use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{info, warn};

use neuron_bridge::{start_server, RelayService, RelayState};
use neuron_core::telemetry::init_logging;
use neuron_core::{LlmService, Orchestrator, ProviderConfig, ServerConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional .env; real environment variables take precedence
    let _ = dotenvy::dotenv();

    let server_cfg = ServerConfig::from_env();
    init_logging(&server_cfg.log_level)?;
    let provider_cfg = ProviderConfig::from_env()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(server_cfg.max_workers)
        .enable_all()
        .build()?;
    runtime.block_on(serve(server_cfg, provider_cfg))
}

async fn serve(
    server_cfg: ServerConfig,
    provider_cfg: ProviderConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let llm = Arc::new(LlmService::new(provider_cfg)?);
    info!(model_info = ?llm.model_info(), "LLM service ready");

    let svc = RelayService::new(RelayState::new(Arc::new(Orchestrator::new(llm))));
    let addr = server_cfg.bind_addr()?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(start_server(addr, svc, async move {
        let _ = shutdown_rx.await;
    }));

    tokio::select! {
        res = &mut server => {
            // Server exited on its own (e.g. bind failure)
            return res?.map_err(|e| e.into());
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Server shutdown requested");
        }
    }

    let _ = shutdown_tx.send(());
    let grace = Duration::from_secs(server_cfg.shutdown_grace_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(res) => {
            res??;
            info!("Server stopped");
        }
        Err(_) => warn!(grace_secs = server_cfg.shutdown_grace_secs, "Grace period elapsed; forcing shutdown"),
    }
    Ok(())
}
