//! KSA Jobs service: binary entrypoint.
//! Loads settings, starts the refresh scheduler, serves the job API until Ctrl-C.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ksa_jobs::config::Settings;
use ksa_jobs::metrics::Metrics;
use ksa_jobs::relevance::RelevanceClassifier;
use ksa_jobs::{router, Service};

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if settings.log_json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c handler failed; shutting down");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let settings = Settings::from_env();
    init_tracing(&settings);

    let metrics = Metrics::init(settings.refresh_interval_secs)?;
    let classifier = RelevanceClassifier::load().context("loading classifier keywords")?;

    let service = Service::build(&settings, classifier);
    let (stop_tx, stop_rx) = watch::channel(false);
    let scheduler_task = service.start(&settings, stop_rx);

    let app = router(service.state.clone()).merge(metrics.router());
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.app_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, debug = settings.debug_mode, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    info!("shutting down");
    let _ = stop_tx.send(true);
    if let Err(e) = scheduler_task.await {
        warn!(error = %e, "scheduler task ended abnormally");
    }
    service.close();
    Ok(())
}
