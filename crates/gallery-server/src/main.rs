mod config;
mod cors;

use std::path::Path;
use std::sync::Arc;

use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use gallery_api::auth::{AppState, AppStateInner};
use gallery_api::host::Cloudinary;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gallery=debug,gallery_api=debug,gallery_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database and image host
    let db = gallery_db::Database::open(&config.db_path)?;
    let host = Cloudinary::new(config.cloudinary.clone())?;
    info!(
        "Images stored in cloud {:?}, folder {:?}",
        config.cloudinary.cloud_name, config.cloudinary.folder
    );

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        host: Arc::new(host),
    });

    let app = gallery_api::router(state)
        .fallback_service(spa_service(&config.web_dir))
        .layer(cors::layer(&config)?)
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!(
        "Gallery server listening on {} ({} mode)",
        addr,
        if config.production { "production" } else { "development" }
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Static client files; unknown paths such as `/signup` or
/// `/profile/{username}` get `index.html` so the client router can take over.
fn spa_service(web_dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(web_dir).fallback(ServeFile::new(web_dir.join("index.html")))
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
