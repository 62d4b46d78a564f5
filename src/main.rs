//! Quiz session backend entrypoint wiring REST, SSE, the session clocks and storage.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quiz_session_back::{
    config::{AppConfig, StoreConfig},
    dao::quiz_store::memory::MemoryQuizStore,
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());
    install_store(&app_state).await;

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state.clone());

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    if let Some(store) = app_state.clear_quiz_store().await {
        if let Err(err) = store.close().await {
            warn!(error = %err, "failed to close storage on shutdown");
        }
    }
    info!("server stopped");

    Ok(())
}

/// Install the configured quiz store. Fallible backends are handed to the
/// storage supervisor, which keeps retrying in the background.
async fn install_store(state: &SharedState) {
    match state.config().store().clone() {
        StoreConfig::Memory => {
            info!("using in-memory quiz store");
            state.set_quiz_store(Arc::new(MemoryQuizStore::new())).await;
        }
        #[cfg(feature = "file-store")]
        StoreConfig::File { path } => {
            use quiz_session_back::{
                dao::quiz_store::{
                    QuizStore,
                    file::{FileQuizStore, FileStoreConfig},
                },
                dao::storage::StorageError,
                services::storage_supervisor,
            };

            info!(path = %path.display(), "using file quiz store");
            let connect = move || {
                let config = FileStoreConfig::new(path.clone());
                async move {
                    let store = FileQuizStore::open(config)
                        .await
                        .map_err(StorageError::from)?;
                    Ok::<Arc<dyn QuizStore>, StorageError>(Arc::new(store))
                }
            };
            tokio::spawn(storage_supervisor::run(state.clone(), connect));
        }
        #[cfg(not(feature = "file-store"))]
        StoreConfig::File { path } => {
            warn!(
                path = %path.display(),
                "file store requested but the `file-store` feature is disabled; using memory"
            );
            state.set_quiz_store(Arc::new(MemoryQuizStore::new())).await;
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
