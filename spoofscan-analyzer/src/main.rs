//! spoofscan-analyzer - Main entry point
//!
//! HTTP service that scores an audio object frame by frame.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;

use spoofscan_analyzer::audio::{AudioNormalizer, Segmenter};
use spoofscan_analyzer::cache::{FrameCache, MemoryKvStore};
use spoofscan_analyzer::config::{
    AnalyzerConfig, StoreBackend, CONFIG_ENV_VAR, CONFIG_FILE_NAME,
};
use spoofscan_analyzer::dispatch::{DispatchSettings, ScoringDispatcher};
use spoofscan_analyzer::scoring::{EnergyScorer, Scorer};
use spoofscan_analyzer::storage::{FsObjectStore, HttpObjectStore, ObjectGateway, ObjectStore};
use spoofscan_analyzer::{build_router, AnalysisPipeline, AppState, PipelineSettings};
use spoofscan_common::config::{init_logging, load_toml_config, ConfigResolver};

/// Command-line arguments for spoofscan-analyzer
#[derive(Parser, Debug)]
#[command(name = "spoofscan-analyzer")]
#[command(about = "Chunked audio analysis service")]
#[command(version)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config file and SPOOFSCAN_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind to (overrides config file)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = ConfigResolver::new(CONFIG_ENV_VAR, CONFIG_FILE_NAME)
        .resolve(args.config.as_deref());
    let mut config: AnalyzerConfig = load_toml_config(config_path.as_deref())
        .context("Failed to load configuration")?;
    config
        .apply_env_overrides()
        .context("Invalid environment override")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    config.validate().context("Invalid configuration")?;

    init_logging(&config.logging, &["spoofscan_analyzer", "spoofscan_common"])
        .context("Failed to initialize logging")?;

    info!("Starting spoofscan-analyzer v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Configuration file: {}", path.display()),
        None => info!("No configuration file found, using built-in defaults"),
    }

    let store = build_object_store(&config)?;
    info!("Object store backend: {}", store.name());

    let kv_store = Arc::new(MemoryKvStore::new());
    let sweeper = Arc::clone(&kv_store)
        .spawn_sweeper(Duration::from_secs(config.cache.sweep_interval_secs));
    let cache = FrameCache::new(kv_store, Duration::from_secs(config.cache.ttl_secs));

    let scorer: Arc<dyn Scorer> = Arc::new(EnergyScorer::new(config.scorer.clone()));
    info!(
        "Scorer: {} ({} workers, {} samples per frame)",
        scorer.name(),
        config.analysis.workers,
        config.analysis.frame_len()
    );

    let pipeline = build_pipeline(&config, store, cache, scorer)?;
    let state = AppState::new(Arc::new(pipeline));
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind, config.port))?;

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper.abort();
    info!("Server shutdown complete");
    Ok(())
}

fn build_object_store(config: &AnalyzerConfig) -> Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config.store.backend {
        StoreBackend::Fs => {
            info!("Store root: {}", config.store.root.display());
            Arc::new(FsObjectStore::new(config.store.root.clone()))
        }
        StoreBackend::Http => {
            let endpoint = config
                .store
                .endpoint
                .clone()
                .context("store.endpoint is required for the http backend")?;
            info!("Store endpoint: {}", endpoint);
            Arc::new(
                HttpObjectStore::new(endpoint, Duration::from_secs(config.store.timeout_secs))
                    .context("Failed to create HTTP object store client")?,
            )
        }
    };
    Ok(store)
}

fn build_pipeline(
    config: &AnalyzerConfig,
    store: Arc<dyn ObjectStore>,
    cache: FrameCache,
    scorer: Arc<dyn Scorer>,
) -> Result<AnalysisPipeline> {
    let analysis = &config.analysis;
    let hints = analysis
        .parsed_codec_hints()
        .context("Invalid codec hints")?;

    let dispatcher = ScoringDispatcher::new(
        cache.clone(),
        scorer,
        DispatchSettings {
            frame_len: analysis.frame_len(),
            workers: analysis.workers,
            score_precision: analysis.score_precision,
            frame_timeout: analysis.frame_timeout(),
        },
    );

    Ok(AnalysisPipeline::new(
        ObjectGateway::new(store, config.store.check_bucket),
        AudioNormalizer::new(analysis.sample_rate, hints),
        Segmenter::new(analysis.frame_len()),
        cache,
        dispatcher,
        PipelineSettings {
            request_timeout: analysis.request_timeout(),
            evict_after_scoring: config.cache.evict_after_scoring,
        },
    ))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
