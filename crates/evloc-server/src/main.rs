mod api;
mod middleware;

use std::{sync::Arc, time::Duration};

use evloc_render::{ArtifactStore, StationLocator};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = evloc_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let catalog = evloc_core::load_catalog(&config.catalog_path)?;
    if catalog.is_empty() {
        tracing::warn!(
            path = %config.catalog_path.display(),
            "station catalog has no rows; every query will fail"
        );
    }

    let store = Arc::new(ArtifactStore::new(config.artifact_dir.clone()));
    let app = build_app(AppState {
        locator: StationLocator::new(catalog, store),
        render_timeout: Duration::from_secs(config.render_timeout_secs),
    });

    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting server");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
