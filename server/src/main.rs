//! Mood Todos HTTP server.
//!
//! Connects to `PostgreSQL`, applies migrations, optionally seeds dummy data
//! and serves the collection API until Ctrl+C or SIGTERM.

mod config;
mod telemetry;

use anyhow::Context;
use config::Config;
use mood_todos_core::todo_store::TodoStore;
use mood_todos_postgres::PostgresTodoStore;
use mood_todos_web::{AppState, RouterConfig, build_router};
use sqlx::postgres::PgPoolOptions;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mood_todos=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mood Todos server");

    let config = Config::from_env()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        base_path = %config.server.base_path,
        "Configuration loaded"
    );

    if let Some(port) = config.metrics_port {
        telemetry::install(SocketAddr::from(([0, 0, 0, 0], port)))?;
    }

    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(config.database.connect_timeout)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    let store = PostgresTodoStore::new(pool.clone());
    store.migrate().await.context("Failed to run migrations")?;
    info!("Database ready");

    if let Some(count) = config.seed_dummy_todos {
        let seeded = store.seed_dummy(i64::from(count)).await?;
        info!(seeded, "Dummy todos seeded");
    }

    let store: Arc<dyn TodoStore> = Arc::new(store);
    let app = build_router(
        AppState::new(store),
        &RouterConfig {
            base_path: config.server.base_path.clone(),
            allow_any_origin: config.server.cors_allow_any_origin,
        },
    );

    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.server.host, config.server.port))?;
    info!(address = %listener.local_addr()?, "Server listening");

    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel();
    let serve = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        })
        .into_future();

    // In-flight requests get `shutdown_timeout` to drain after the signal
    tokio::select! {
        result = serve => result?,
        () = async {
            let _ = signalled_rx.await;
            tokio::time::sleep(config.server.shutdown_timeout).await;
        } => {
            warn!(timeout = ?config.server.shutdown_timeout, "Graceful shutdown timed out");
        },
    }

    pool.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
