//! Tally API Server
//!
//! Main entry point for the Tally backend service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tally_api::{AppState, create_router};
use tally_core::storage::{FileStore, StorageConfig};
use tally_core::store::Stores;
use tally_core::{BillingDefaults, Services};
use tally_shared::config::LoggingConfig;
use tally_shared::jwt::JwtConfig;
use tally_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    let stores = if config.database.is_memory() {
        info!("Using in-process store; data is lost on restart");
        Stores::memory()
    } else {
        let db = tally_db::connect_with(&config.database).await?;
        info!("Connected to database");
        tally_db::pg_stores(&db)
    };

    let files = FileStore::from_config(StorageConfig::from_settings(&config.storage)?)?;
    info!(provider = %config.storage.provider, "File storage configured");

    let jwt_service = Arc::new(JwtService::new(JwtConfig::from(&config.jwt)));
    let services = Services::build(
        &stores,
        files,
        jwt_service.clone(),
        BillingDefaults::from(&config.billing),
    );

    let state = AppState {
        services,
        jwt_service,
        max_upload_bytes: usize::try_from(config.storage.max_upload_bytes).unwrap_or(usize::MAX),
    };
    let app = create_router(state, &config.cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tally=debug,tally_api=debug,tally_core=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
