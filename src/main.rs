use dotenvy::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fne_manager::config::Config;
use fne_manager::database::schema;
use fne_manager::services::fne_client::FneClient;
use fne_manager::services::session_service;
use fne_manager::web::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // 1. Logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Config
    let config = Config::load()?;
    info!(name = %config.server.name, "Config loaded");

    // 3. Database
    let options = SqliteConnectOptions::from_str(&config.database.url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    schema::bootstrap(&pool).await?;
    info!("Connected to database {}", config.database.url);
    let purged = session_service::purge_expired(&pool, config.server.session_ttl_hours).await?;
    info!(purged, "Expired sessions cleared");

    // 4. FNE client
    let fne = FneClient::new(&config.fne)?;
    info!("FNE REST API at {}", fne.base_url());

    let host = config.server.bind_address.clone();
    let port = config.server.port;
    let state = AppState {
        pool,
        fne: Arc::new(fne),
        config: Arc::new(config),
    };
    let app = build_router(state);

    // 5. Serve (falls back to the next port when the configured one is taken)
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            let fallback: SocketAddr = format!("{}:{}", host, port.saturating_add(1)).parse()?;
            warn!("Could not bind {}: {}. Trying {}", addr, e, fallback);
            tokio::net::TcpListener::bind(fallback).await?
        }
    };

    info!("FNE Manager listening on http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("FNE Manager stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
