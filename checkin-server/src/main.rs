//! checkin-server - event check-in backend
//!
//! Serves the roster and check-in API over HTTPS (or plain HTTP with
//! `--no-tls`) and resets the daily counter at local midnight.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkin_common::config::load_toml_config;
use checkin_server::config::{Args, Config};
use checkin_server::rollover::spawn_daily_rollover;
use checkin_server::state::SharedState;
use checkin_server::store::ParticipantStore;
use checkin_server::{build_router, AppState};

/// Time allowed for in-flight requests once a shutdown signal arrives
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkin_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting checkin-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let toml_config = load_toml_config(args.config.as_deref())
        .context("Failed to load configuration file")?;
    let config = Config::resolve(&args, &toml_config).context("Invalid configuration")?;

    info!("Root folder: {}", config.root_folder.display());
    info!("Event timezone: {}", config.timezone);

    let store = ParticipantStore::load(&config.data_file)
        .with_context(|| format!("Failed to load {}", config.data_file.display()))?;

    let shared = Arc::new(SharedState::new(store, config.timezone));
    let _rollover = spawn_daily_rollover(Arc::clone(&shared), config.rollover_poll);

    let config = Arc::new(config);
    let addr = config.socket_addr();
    let app = build_router(AppState::new(shared, Arc::clone(&config)));

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    match &config.tls {
        Some(tls) => {
            let rustls = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                .await
                .with_context(|| {
                    format!(
                        "Failed to load TLS certificate {} / key {}",
                        tls.cert.display(),
                        tls.key.display()
                    )
                })?;
            info!("Listening on https://{}", addr);
            axum_server::bind_rustls(addr, rustls)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("Server error")?;
        }
        None => {
            warn!("TLS disabled, serving plain HTTP");
            info!("Listening on http://{}", addr);
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("Server error")?;
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then drain the server
async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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

    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
