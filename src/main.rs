use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use stream_asr::{
    create_router, AppState, Config, ContainerDecoder, FileRecognizer, InferenceEngine,
    NatsEngine, ServiceInfo, SessionRegistry,
};
use tracing::info;

/// Streaming speech recognition server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/stream-asr")]
    config: String,

    /// Override the bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut cfg = Config::load(&cli.config)?;
    if let Some(bind) = cli.bind {
        cfg.service.http.bind = bind;
    }
    if let Some(port) = cli.port {
        cfg.service.http.port = port;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Model: {} via {}", cfg.engine.model, cfg.engine.nats_url);

    let settings = cfg.streaming.settings()?;
    info!(
        "Window: {} samples, minimum frame {} samples",
        settings.params.chunk_stride(),
        settings.min_samples
    );

    let engine: Arc<dyn InferenceEngine> = Arc::new(
        NatsEngine::connect(&cfg.engine.nats_url, cfg.engine.subject.clone())
            .await
            .context("Failed to initialize inference engine")?,
    );

    let registry = SessionRegistry::new(settings.params.chunk_stride());
    let recognizer = Arc::new(FileRecognizer::new(
        engine.clone(),
        Arc::new(ContainerDecoder),
        registry.clone(),
        settings.clone(),
        cfg.streaming.sample_rate,
    ));

    let state = AppState {
        registry: registry.clone(),
        engine,
        recognizer,
        settings,
        info: ServiceInfo {
            name: cfg.service.name.clone(),
            model: cfg.engine.model.clone(),
            max_upload_bytes: cfg.service.http.max_upload_bytes,
        },
    };

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on {}", addr);
    info!("Service stats: {:?}", registry.stats());

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shutting down, final stats: {:?}", registry.stats());

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
