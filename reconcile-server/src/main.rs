//! Binary entrypoint: loads layered configuration, wires the Postgres
//! pool, object store, and workflow coordinator, then serves the HTTP
//! surface. Mirrors the teacher's own `app-server` binary's role as a
//! thin composition root over library crates, adapted to `axum::serve`
//! for the REST surface grounded on `barockok-kalla-rust/kalla-server`.

use std::sync::Arc;

use anyhow::Context;
use reconcile_api::ApiState;
use reconcile_config::AppConfig;
use reconcile_store::PgStore;
use reconcile_workflow::WorkflowCoordinator;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config".to_string());
    let config = AppConfig::load(&config_path).context("failed to load configuration")?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("failed to connect to database")?;
    sqlx::migrate!("../migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    let store = Arc::new(PgStore::new(pool));
    let objects = reconcile_storage::build_s3_store(&config.storage.clone().into())
        .context("failed to build object store client")?;

    let coordinator = Arc::new(WorkflowCoordinator::new(store, objects));
    let state = Arc::new(ApiState { coordinator });
    let router = reconcile_api::build_router(state, &config.server.api_prefix, config.credentials_map());

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "starting reconcile-server");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to install Ctrl+C handler");
            return;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut signal = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                tracing::error!(%err, "failed to install SIGTERM handler");
                return;
            }
        };
        signal.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
