mod demo;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use trellis::{Config, SharedApp};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("trellis starting...");

    let config = Config::load_default().context("Failed to load config")?;
    info!("Port: {}, Routes: {}", config.server.port, config.routing.routes_dir);

    let shared = Arc::new(
        SharedApp::new(config, demo::registry()).context("Failed to build route table")?,
    );

    reload_on_hangup(shared.clone());

    trellis::serve(shared, shutdown_signal()).await
}

/// Rebuilds the route table on SIGHUP; a failed rebuild keeps the old one
#[cfg(unix)]
fn reload_on_hangup(shared: Arc<SharedApp>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(hangups) => hangups,
            Err(e) => {
                error!("Failed to listen for SIGHUP: {}", e);
                return;
            }
        };

        while hangups.recv().await.is_some() {
            info!("SIGHUP received, reloading routes");
            let shared = shared.clone();
            match tokio::task::spawn_blocking(move || shared.reload()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("{:#}", e),
                Err(e) => error!("Reload task failed: {}", e),
            }
        }
    });
}

#[cfg(not(unix))]
fn reload_on_hangup(_shared: Arc<SharedApp>) {
    info!("Reload on SIGHUP is only available on unix");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
