use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::utils::startup_utils::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub database: String,
    pub overall: String,
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let (status, database) = match state.db.health_check().await {
        Ok(_) => (StatusCode::OK, "healthy".to_string()),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {}", e)),
    };

    let overall = if status == StatusCode::OK { "healthy" } else { "unhealthy" }.to_string();

    (status, Json(HealthStatus { database, overall }))
}
