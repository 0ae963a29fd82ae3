use std::sync::Arc;

use invite_core::config_store::ConfigStore;
use invite_db::repositories::InvitationJobRepo;
use invite_events::EmailConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use invite_worker::{runner_factory, PgJobQueue, WorkerConfig, WorkerPool};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "invite_worker=debug,invite_events=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env().expect("Invalid worker configuration");
    let email = EmailConfig::from_env()
        .expect("SMTP_SERVER, SMTP_USER and SMTP_PASSWORD must be set");
    tracing::info!(
        config_path = %config.storage.config_path.display(),
        soft_limit_secs = config.limits.soft().as_secs(),
        hard_limit_secs = config.limits.hard().as_secs(),
        smtp_server = %email.smtp_server,
        smtp_port = email.smtp_port,
        "Loaded worker configuration",
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = invite_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    invite_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    invite_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    match InvitationJobRepo::pending_count(&pool).await {
        Ok(pending) => tracing::info!(pending, "Jobs waiting in queue"),
        Err(e) => tracing::warn!(error = %e, "Failed to count queued jobs"),
    }

    // --- Worker pool ---
    let store = Arc::new(ConfigStore::new(config.storage.config_path.clone()));
    let factory = runner_factory(store, config.storage.clone(), config.limits, email);
    // Bad SMTP settings abort startup.
    factory().expect("Failed to build SMTP transport");
    let worker_pool = WorkerPool::new(
        Arc::new(PgJobQueue::new(pool.clone())),
        factory,
        config.pool.clone(),
    );

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    let pool_handle = tokio::spawn(async move {
        worker_pool.run(cancel_clone).await;
    });

    shutdown_signal().await;

    // --- Post-shutdown cleanup ---
    cancel.cancel();
    let _ = pool_handle.await;
    tracing::info!("Worker pool drained");

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
