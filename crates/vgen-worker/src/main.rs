//! Generation worker binary.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vgen_providers::{adapters_from_env, Orchestrator};
use vgen_storage::{ObjectStore, R2Store};
use vgen_store::{JobStore, MemoryJobStore};
use vgen_worker::{GenerationWorker, WorkerConfig};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vgen=info".parse().expect("valid directive"))
        .add_directive("hyper=warn".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting vgen-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let adapters = adapters_from_env();
    if adapters.is_empty() {
        error!("No provider credentials configured; nothing to do");
        std::process::exit(1);
    }
    info!("Registered {} provider adapter(s)", adapters.len());

    let mut orchestrator = Orchestrator::new(adapters);
    match R2Store::from_env() {
        Ok(store) => {
            info!("Re-hosting results to R2");
            orchestrator = orchestrator.with_object_store(Arc::new(store) as Arc<dyn ObjectStore>);
        }
        Err(e) => warn!("R2 not configured, provider URLs used as-is: {}", e),
    }

    let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
    let worker = GenerationWorker::new(store, Arc::new(orchestrator), config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    if let Err(e) = worker.run(shutdown_rx).await {
        error!("Worker error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}
