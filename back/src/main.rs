use std::{sync::Arc, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use clap::Parser;
use tokio::signal;
use todo_back::{
    config::{Config, StorageKind},
    store::{MemoryStore, SqliteStore, TodoStore},
    AppState,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const ROUTES: &[&str] = &[
    "POST   /todos            create a todo",
    "GET    /todos            list todos",
    "GET    /todos/:id        get a todo",
    "PUT    /todos/:id        replace a todo",
    "PATCH  /todos/:id        update a todo",
    "DELETE /todos/:id        delete a todo",
    "PATCH  /todos/:id/toggle toggle completion",
];

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.default_log_filter())),
        )
        .init();

    let store: Arc<dyn TodoStore> = match config.storage {
        StorageKind::Memory => Arc::new(MemoryStore::with_snapshot(&config.data_file)),
        StorageKind::Sqlite => Arc::new(SqliteStore::open(&config.database)?),
    };
    store.load().await?;

    let addr = config.addr()?;
    let app = todo_back::app(Arc::new(AppState::new(store.clone())));

    let handle = Handle::new();
    tokio::spawn(shutdown_on_signal(handle.clone(), config.shutdown_timeout()));

    info!(
        %addr,
        storage = ?config.storage,
        environment = ?config.environment,
        tls = config.tls().is_some(),
        "todo api listening"
    );
    for route in ROUTES {
        info!("  {route}");
    }

    match config.tls() {
        Some((cert, key)) => {
            let tls = RustlsConfig::from_pem_file(cert, key).await?;

            axum_server::bind_rustls(addr, tls)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    info!("server closed, flushing store");

    todo_back::flush_store(store.as_ref(), config.shutdown_timeout()).await;

    Ok(())
}

async fn shutdown_on_signal(handle: Handle, timeout: Duration) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    };

    info!(signal, ?timeout, "shutting down gracefully");
    handle.graceful_shutdown(Some(timeout));
}
