mod cleanup;
mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use onair_api::mailer::{LogMailer, Mailer, RelayMailer};
use onair_api::{AppState, AppStateInner};
use onair_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "onair=debug,onair_api=debug,onair_db=info,tower_http=debug".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {:#}", e);
            eprintln!("       Fix your environment or .env file and restart.");
            std::process::exit(1);
        }
    };

    let db = Database::open(&config.db_path)?;

    let mailer: Arc<dyn Mailer> = match &config.mail_relay_url {
        Some(url) => {
            info!("Sending mail through relay at {}", url);
            Arc::new(RelayMailer::new(url.clone(), config.mail_relay_key.clone())?)
        }
        None => {
            warn!("ONAIR_MAIL_RELAY_URL not set; verification mail will only be logged");
            Arc::new(LogMailer)
        }
    };

    if config.settings.expose_code {
        warn!("ONAIR_EXPOSE_CODE is on: verification codes are returned to the browser");
    }

    let state: AppState = Arc::new(AppStateInner {
        db,
        mailer,
        settings: config.settings,
    });

    // Background cleanup of stale verification codes
    tokio::spawn(cleanup::run_cleanup_loop(state.clone(), config.cleanup_interval_secs));

    let app = onair_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Broadcast request portal listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
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
