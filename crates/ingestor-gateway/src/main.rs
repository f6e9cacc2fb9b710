//! ingestor gateway binary.
//!
//! - API listener: /image-upload, /text-upload, /csv-row-process, /healthz
//!   (and /metrics unless disabled)
//! - Dedicated scrape listener for /metrics
//! - Graceful shutdown on Ctrl-C

use std::net::SocketAddr;

use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use ingestor_gateway::{app_state, config, obs, router};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ingestor.yaml".to_string());
    let cfg = config::load_or_default(&path).expect("config load failed");

    // validate() already checked both addresses
    let api_listen: SocketAddr = cfg.api.listen.parse().expect("api.listen must be a valid SocketAddr");
    let metrics_listen: Option<SocketAddr> = cfg
        .metrics
        .listen
        .as_deref()
        .map(|l| l.parse().expect("metrics.listen must be a valid SocketAddr"));

    let state = app_state::AppState::new(cfg).expect("app state init failed");

    if state.cfg().classifier.warmup {
        if let Err(e) = state.classifier().model().await {
            tracing::warn!(error = %e, "classifier warmup failed, will retry on first upload");
        }
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
        }
        let _ = shutdown_tx.send(true);
    });

    if let Some(addr) = metrics_listen {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("failed to bind metrics listener");
        tracing::info!(listen = %addr, path = %state.cfg().metrics.path, "metrics server starting");
        tokio::spawn(obs::exporter::serve_metrics(
            listener,
            state.clone(),
            wait_for_shutdown(shutdown_rx.clone()),
        ));
    }

    let app = router::build_router(state);

    tracing::info!(listen = %api_listen, "ingestor-gateway starting");
    let listener = tokio::net::TcpListener::bind(api_listen)
        .await
        .expect("failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx))
        .await
        .expect("server failed");
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
