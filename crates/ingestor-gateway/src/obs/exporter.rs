//! Metrics exporter: renders the registry (plus process gauges) and serves it
//! on the dedicated scrape listener.

use std::future::Future;

use axum::{routing::get, Router};
use tokio::net::TcpListener;

use ingestor_core::metrics::render_snapshot;

use crate::app_state::AppState;
use crate::ops;

/// Full scrape body. Reads a snapshot; never mutates the registry.
pub fn render_metrics(state: &AppState) -> String {
    let mut out = String::new();
    render_snapshot(&state.registry().snapshot(), &mut out);
    if state.cfg().metrics.process_metrics {
        state.process().render(&mut out);
    }
    out
}

/// Router for the scrape listener. No timing layer: scrapes are never measured.
pub fn metrics_router(state: AppState) -> Router {
    let path = state.cfg().metrics.path.clone();
    Router::new()
        .route(&path, get(ops::metrics))
        .with_state(state)
}

pub async fn serve_metrics<F>(listener: TcpListener, state: AppState, shutdown: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = metrics_router(state);
    if let Err(err) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::warn!(%err, "metrics server exited unexpectedly");
    }
}
