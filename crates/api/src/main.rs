use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use invite_core::assets::AssetStore;
use invite_core::config_store::ConfigStore;
use invite_events::EmailConfig;
use invite_worker::{
    runner_factory, Dispatcher, JobQueue, MemoryQueue, PgJobQueue, WorkerConfig, WorkerPool,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use invite_api::config::ServerConfig;
use invite_api::router::build_app_router;
use invite_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "invite_api=debug,invite_worker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let worker_config = WorkerConfig::from_env().expect("Invalid worker configuration");
    let storage = worker_config.storage.clone();
    let store = Arc::new(ConfigStore::new(storage.config_path.clone()));
    let cancel = CancellationToken::new();

    // --- Job queue ---
    // With a database the queue is durable and consumed by `invite-worker`
    // processes. Without one, jobs run on a pool inside this process.
    let (queue, pool_handle): (Arc<dyn JobQueue>, Option<JoinHandle<()>>) =
        match std::env::var("DATABASE_URL") {
            Ok(database_url) => {
                let pool = invite_db::create_pool(&database_url)
                    .await
                    .expect("Failed to connect to database");
                invite_db::health_check(&pool)
                    .await
                    .expect("Database health check failed");
                invite_db::run_migrations(&pool)
                    .await
                    .expect("Failed to run database migrations");
                tracing::info!("Using PostgreSQL job queue");
                (Arc::new(PgJobQueue::new(pool)) as Arc<dyn JobQueue>, None)
            }
            Err(_) => {
                let queue = Arc::new(MemoryQueue::new());
                let handle = spawn_embedded_pool(
                    &worker_config,
                    Arc::clone(&store),
                    queue.clone(),
                    cancel.clone(),
                );
                tracing::warn!("DATABASE_URL not set, using in-memory job queue");
                (queue as Arc<dyn JobQueue>, Some(handle))
            }
        };

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::clone(&store),
        fonts: AssetStore::fonts(storage.font_folder.clone()),
        templates: AssetStore::templates(storage.template_folder.clone()),
        dispatcher: Arc::new(Dispatcher::new(store, queue)),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    if let Some(handle) = pool_handle {
        // In-flight jobs end within the hard limit.
        let grace = worker_config.limits.hard() + Duration::from_secs(1);
        let _ = tokio::time::timeout(grace, handle).await;
        tracing::info!("Embedded worker pool stopped");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Start a worker pool consuming the in-memory queue.
fn spawn_embedded_pool(
    worker_config: &WorkerConfig,
    store: Arc<ConfigStore>,
    queue: Arc<MemoryQueue>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let email = EmailConfig::from_env()
        .expect("SMTP_SERVER, SMTP_USER and SMTP_PASSWORD must be set");
    let factory = runner_factory(
        store,
        worker_config.storage.clone(),
        worker_config.limits,
        email,
    );
    factory().expect("Failed to build SMTP transport");

    let pool = WorkerPool::new(queue, factory, worker_config.pool.clone());
    tokio::spawn(async move {
        pool.run(cancel).await;
    })
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
