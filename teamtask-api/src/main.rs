//! # TeamTask API Server
//!
//! HTTP API for team task tracking: registration and login, teams and
//! invites, tasks with a change history, comments and reports.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment (`.env` is honored)
//! 2. Connect to PostgreSQL and apply pending migrations
//! 3. Connect to Redis for the tasks cache (falls back to an in-process
//!    cache when Redis is unreachable)
//! 4. Build the breaker-guarded mailer
//! 5. Serve until SIGINT/SIGTERM, then drain in-flight requests
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p teamtask-api
//! ```

use std::sync::Arc;
use std::time::Duration;
use teamtask_api::app::{build_router, AppState};
use teamtask_api::config::{Config, LogFormat};
use teamtask_shared::breaker::{BreakerConfig, CircuitBreaker};
use teamtask_shared::cache::{MemoryTasksCache, RedisTasksCache, TasksCache};
use teamtask_shared::db::{self, pool::DatabaseConfig};
use teamtask_shared::mailer::{BreakerMailer, HttpMailer, HttpMailerConfig, LogMailer, Mailer};
use teamtask_shared::redis::{client::sanitize_url, RedisClient};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Time allowed for in-flight requests after a shutdown signal
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing(config.log_format);

    tracing::info!(
        "TeamTask API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    // Database
    let pool = db::pool::create_pool(DatabaseConfig {
        max_connections: config.database.max_connections,
        ..DatabaseConfig::with_url(config.database.url.clone())
    })
    .await?;

    if config.database.migrations_auto {
        db::migrations::run_migrations(&pool).await?;
    }

    // Tasks cache
    let cache: Arc<dyn TasksCache> = match RedisClient::connect(config.redis.clone()).await {
        Ok(client) => Arc::new(RedisTasksCache::new(client)),
        Err(e) => {
            tracing::warn!(
                url = %sanitize_url(&config.redis.url),
                error = %e,
                "Redis unavailable, using in-process tasks cache"
            );
            Arc::new(MemoryTasksCache::new())
        }
    };

    let mailer = build_mailer(&config)?;

    let addr = config.bind_address();
    let state = AppState::new(pool.clone(), config, mailer, cache);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    let shutdown = CancellationToken::new();
    let server_shutdown = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
            .await
    });

    tokio::select! {
        result = &mut server => {
            // Server stopped on its own
            result??;
            db::pool::close_pool(pool).await;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    tracing::info!("Shutdown signal received, draining connections...");
    shutdown.cancel();

    match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
        Ok(Ok(Ok(()))) => tracing::info!("Server stopped"),
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "Server error during shutdown"),
        Ok(Err(e)) => tracing::error!(error = %e, "Server task failed"),
        Err(_) => tracing::warn!(
            grace_secs = SHUTDOWN_GRACE.as_secs(),
            "In-flight requests did not finish in time"
        ),
    }

    db::pool::close_pool(pool).await;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "teamtask_api=debug,teamtask_shared=debug,tower_http=debug".into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// HTTP mailer when a mail API is configured, log mailer otherwise; both
/// behind the circuit breaker
fn build_mailer(config: &Config) -> anyhow::Result<Arc<dyn Mailer>> {
    let breaker = Arc::new(CircuitBreaker::new("mailer", BreakerConfig::default()));

    let mailer: Arc<dyn Mailer> = match &config.mail.api_url {
        Some(api_url) => {
            tracing::info!("Sending mail through {}", api_url);
            let http = HttpMailer::new(HttpMailerConfig {
                api_url: api_url.clone(),
                api_key: config.mail.api_key.clone(),
                from: config.mail.from.clone(),
            })?;
            Arc::new(BreakerMailer::new(http, breaker))
        }
        None => {
            tracing::info!("MAIL_API_URL not set, mail will be logged");
            Arc::new(BreakerMailer::new(LogMailer::new(), breaker))
        }
    };

    Ok(mailer)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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
}
