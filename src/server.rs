//! HTTP server initialization and runtime setup.
//!
//! Handles storage and rate-limit backend selection, worker spawning, and the
//! Axum server lifecycle.

use crate::application::services::AdmissionController;
use crate::config::Config;
use crate::domain::click_recorder::ClickRecorder;
use crate::domain::click_worker::run_click_worker;
use crate::infrastructure::persistence::MemoryStore;
use crate::infrastructure::rate_limit::{
    MemoryRateLimitStore, RateLimitStore, RedisRateLimitStore,
};
use crate::routes::app_router;
use crate::state::{AppState, Repositories, Settings};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// How often expired in-process rate-limit windows are purged.
const RATE_LIMIT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations (or the in-memory store)
/// - Redis rate-limit counters (or in-process counters only)
/// - Background click worker
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let repositories = connect_storage(&config).await?;
    let admission = Arc::new(connect_admission(&config).await);

    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);
    tokio::spawn(run_click_worker(
        click_rx,
        repositories.clicks.clone(),
        config.click_worker_concurrency,
    ));

    let state = AppState::new(
        repositories,
        admission,
        ClickRecorder::new(click_tx),
        Settings::from_config(&config),
    );

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");

    Ok(())
}

async fn connect_storage(config: &Config) -> Result<Repositories> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("No database configured, links are kept in memory");
        return Ok(Repositories::in_memory(Arc::new(MemoryStore::new())));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations applied");

    Ok(Repositories::postgres(Arc::new(pool)))
}

async fn connect_admission(config: &Config) -> AdmissionController {
    let fallback = Arc::new(MemoryRateLimitStore::new());
    fallback.clone().spawn_sweeper(RATE_LIMIT_SWEEP_INTERVAL);

    let primary: Option<Arc<dyn RateLimitStore>> = match &config.redis_url {
        Some(redis_url) => match RedisRateLimitStore::connect(redis_url).await {
            Ok(store) => {
                tracing::info!("Rate limits shared via Redis");
                Some(Arc::new(store))
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using in-process counters.", e);
                None
            }
        },
        None => {
            tracing::info!("Rate limits kept in process");
            None
        }
    };

    AdmissionController::new(primary, fallback)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
