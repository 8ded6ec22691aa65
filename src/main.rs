use progress_tracker::{router, AccessGuard, AppState, Settings, TrackerConfig};
use std::net::SocketAddr;
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let settings = Settings::from_env();
    let config = TrackerConfig::load(settings.config_path.as_deref())?;
    info!(
        tracks = config.tracks.len(),
        start = %config.start_date,
        end = %config.end_date,
        "loaded tracker config"
    );

    if let Some(parent) = settings.data_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let guard = AccessGuard::new(settings.edit_password.clone(), settings.secure_cookies);
    if !guard.editing_enabled() {
        warn!("EDIT_PASSWORD is not set; the tracker is read-only");
    }

    let state = AppState::new(config, guard, settings.data_path.clone());
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
