//! HTTP boundary for the triage pipeline.
//!
//! The serving layer owns no business logic: it deserializes the inbound
//! request, takes the embedder lock, runs the orchestrator once, and maps
//! the error taxonomy onto HTTP statuses. Models live in the shared
//! [`TriageContext`], loaded once before the router is built.

mod error;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use triage_ai::SymptomEncoder;
use triage_pipeline::TriageContext;

pub use error::{AppError, AppResult};

/// Shared application state.
///
/// The context is immutable and freely concurrent; the embedder needs
/// `&mut self` for ONNX session runs, so it sits behind the one mutex in the
/// system. It guards no cross-request state.
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<TriageContext>,
    pub encoder: Arc<Mutex<Box<dyn SymptomEncoder>>>,
    pub top_k: usize,
}

/// Build the router with all routes and layers.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(state);
    tracing::info!("triage server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
