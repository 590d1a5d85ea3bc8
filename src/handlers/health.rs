use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::info;

use super::AppState;
use crate::models::{HealthResponse, ModelsResponse};

/// Health check endpoint. Degraded means the server runs but has no provider key.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let api_configured = state.llm.is_configured();
    let status = if api_configured { "ok" } else { "degraded" };

    info!(status = status, api_configured = api_configured, "Health check completed");

    Json(HealthResponse {
        status: status.to_string(),
        api_configured,
        default_model: state.catalog.current().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Readiness check endpoint
pub async fn ready_handler(State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    if state.llm.is_configured() {
        Ok(StatusCode::OK)
    } else {
        info!("Readiness check failed - provider API key not configured");
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

pub async fn models_handler(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.catalog.models().to_vec(),
        current: state.catalog.current().to_string(),
    })
}
