/// Health check endpoint
///
/// `GET /health` is public and reports whether the process is up and can
/// reach its database. A failed connectivity probe degrades the status but
/// still returns 200; the body is the signal, not the status code.
use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use taskhub_shared::db::pool::health_check as probe_database;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" when every probe passed, "degraded" otherwise
    pub status: String,

    /// Application version
    pub version: String,

    /// Database probe result, "connected" or "disconnected"
    pub database: String,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, database) = match probe_database(&state.db).await {
        Ok(()) => ("healthy", "connected"),
        Err(_) => ("degraded", "disconnected"),
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    })
}
