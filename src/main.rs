//! SkiClub backend
//!
//! Main application entry point

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use skiclub::{
    build_router,
    config::Settings,
    database::{create_pool, run_migrations, DatabaseService},
    services::{RedisService, ServiceFactory},
    utils::logging,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate()?;

    // Initialize logging; the guard flushes the log file on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", skiclub::info());

    info!("Connecting to database...");
    let db_pool = create_pool(&settings.database).await?;
    run_migrations(&db_pool).await?;
    let database_service = DatabaseService::new(db_pool);

    let redis_service = match RedisService::new(&settings.redis) {
        Ok(redis) if redis.health_check().await => Some(redis),
        Ok(redis) => {
            warn!("Redis not reachable at startup, reminder lock will be retried per run");
            Some(redis)
        }
        Err(e) => {
            warn!(error = %e, "Invalid Redis configuration, reminders run without a lock");
            None
        }
    };

    info!("Initializing services...");
    let services = ServiceFactory::new(database_service.clone(), &settings, redis_service)?;
    let bind_address = settings.bind_address();
    let state = AppState::new(database_service, services, settings);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    info!(address = %bind_address, "SkiClub API is ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("SkiClub API has been shut down.");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
