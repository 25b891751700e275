//! Request handlers.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use triage_core::PatientInput;
use triage_pipeline::{TriageResponse, run_triage};

use crate::{AppResult, AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

/// Run one triage prediction. All-or-nothing: any pipeline failure surfaces
/// as a single structured error, never a partial prediction.
pub async fn predict(
    State(state): State<AppState>,
    Json(patient): Json<PatientInput>,
) -> AppResult<Json<TriageResponse>> {
    let mut encoder = state.encoder.lock().await;
    let payload = run_triage(&state.ctx, encoder.as_mut(), &patient, state.top_k)?;
    Ok(Json(payload.response()))
}
