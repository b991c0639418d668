mod chat;
mod routes;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use txplain_core::Explainer;

use crate::{error::Error, interfaces::ServeArgs};

/// The address the server listens on by default
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// The port the server listens on by default
pub const DEFAULT_PORT: u16 = 8000;

/// State shared by every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    explainer: Arc<Explainer>,
}

impl AppState {
    /// Wraps an explainer for sharing between handlers.
    pub fn new(explainer: Explainer) -> Self {
        Self { explainer: Arc::new(explainer) }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/tx/{txhash}", get(routes::tagged_tx))
        .route("/simulate", get(routes::simulate))
        .route("/ws", get(chat::chat))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves `explainer` until ctrl-c is received.
pub async fn serve(args: ServeArgs, explainer: Explainer) -> Result<(), Error> {
    let host = match args.host.is_empty() {
        true => DEFAULT_HOST,
        false => args.host.as_str(),
    };
    let port = args.port.unwrap_or(DEFAULT_PORT);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("listening on http://{} .", listener.local_addr()?);

    axum::serve(listener, router(AppState::new(explainer)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped .");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {} .", e);
    }
}
