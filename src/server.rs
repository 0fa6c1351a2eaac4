//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, background task spawning, and
//! Axum server lifecycle including graceful shutdown.

use crate::config::{CacheConfig, Config, DatabaseConfig};
use crate::domain::click_worker::{ClickRecorder, run_click_worker};
use crate::domain::rate_limiter::{DEFAULT_SWEEP_INTERVAL, RateLimiters};
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence::{PgClickRepository, PgLinkRepository};
use crate::routes::app_router;
use crate::state::{AppState, StateSettings};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Opens the PostgreSQL pool with the configured limits and statement timeout.
///
/// # Errors
///
/// Returns an error if the URL is malformed or no connection can be made.
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let options = PgConnectOptions::from_str(&config.url)
        .context("Invalid DATABASE_URL")?
        .options([(
            "statement_timeout",
            format!("{}ms", config.statement_timeout.as_millis()),
        )]);

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect_with(options)
        .await
        .context("Failed to connect to database")
}

/// Selects the cache variant once for the lifetime of the process.
///
/// Redis is used when configured and reachable; anything else falls back to
/// [`NullCache`].
pub async fn select_cache(config: &CacheConfig) -> Arc<dyn CacheService> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url, config.ttl, config.op_timeout).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache (or NullCache fallback)
/// - Background click worker
/// - Rate-limit sweepers
/// - Axum HTTP server
///
/// On Ctrl-C or SIGTERM the server stops accepting connections, the sweepers
/// are cancelled and queued clicks are flushed before returning.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_pool(&config.database).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let cache = select_cache(&config.cache).await;

    let pool = Arc::new(pool);
    let link_repository = Arc::new(PgLinkRepository::new(pool.clone()));
    let click_repository = Arc::new(PgClickRepository::new(pool.clone()));

    let (click_recorder, click_rx) = ClickRecorder::channel(config.clicks.queue_capacity);
    let click_worker = tokio::spawn(run_click_worker(
        click_rx,
        click_repository.clone(),
        config.clicks.worker_concurrency,
    ));
    tracing::info!("Click worker started");

    let shutdown = CancellationToken::new();
    let rate_limiters = RateLimiters::new();
    let sweepers = rate_limiters.spawn_sweepers(DEFAULT_SWEEP_INTERVAL, shutdown.clone());

    let state = AppState::new(
        link_repository,
        click_repository,
        cache,
        click_recorder,
        rate_limiters,
        StateSettings {
            base_url: config.http.base_url.clone(),
            behind_proxy: config.http.behind_proxy,
            cache_ttl: config.cache.ttl,
        },
    );

    let app = app_router(state);

    let addr: SocketAddr = config
        .http
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.http.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped, draining background tasks");

    shutdown.cancel();
    for sweeper in sweepers {
        let _ = sweeper.await;
    }

    // The router (and every ClickRecorder clone) is gone, so the worker
    // drains the queue and exits.
    if let Err(e) = click_worker.await {
        tracing::error!("Click worker terminated abnormally: {}", e);
    }

    pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl-C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
