//! Server startup and graceful shutdown.

use std::future::Future;

use tokio::net::TcpListener;

use crate::config::ServerConfig;

use super::{
    error::ServerError, maintenance::spawn_retention_sweep, router::build_router,
    signal::shutdown_signal, state::AppState,
};

/// Bind the configured address and serve until Ctrl+C / SIGTERM.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    serve(listener, config, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` completes.
pub async fn serve<F>(
    listener: TcpListener,
    config: ServerConfig,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = AppState::new(&config);
    spawn_retention_sweep(state.clone(), config.retention_sweep_interval()).await;

    let app = build_router(state.clone());

    let local_addr = listener.local_addr()?;
    tracing::info!(
        "Polling server listening on {} (tick {}ms, chat retention {} days)",
        local_addr,
        config.tick_interval_ms,
        config.chat_retention_days
    );
    tracing::info!("WebSocket endpoint: ws://{}/ws", local_addr);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    state.shutdown().await;
    tracing::info!("Server stopped");
    result.map_err(ServerError::from)
}
