pub mod catalog;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod routes;
pub mod signature;
pub mod state;

#[cfg(test)]
mod testing;

use std::future::Future;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use pipeline::{Intake, Pipeline};
pub use state::AppState;

/// Build the axum Router with the webhook and health routes.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::health::health))
        .route("/webhook/square", post(routes::webhook::square_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on a pre-bound listener until `shutdown` resolves, then wait for
/// every order and dispense cycle still running to finish, so no relay is
/// left engaged when the process exits.
pub async fn serve_on(
    state: AppState,
    listener: tokio::net::TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let pipeline = std::sync::Arc::clone(&state.pipeline);
    let app = build_router(state);

    tracing::info!("vending controller listening on http://0.0.0.0:{actual_port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    let pending = pipeline.in_flight().count();
    if pending > 0 {
        tracing::info!(pending, "waiting for in-flight dispenses to finish");
    }
    pipeline.in_flight().wait_idle().await;
    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {e}");
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
    tracing::info!("shutdown signal received");
}
