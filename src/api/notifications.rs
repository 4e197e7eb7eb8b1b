use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::notification::{PushSubscription, QueueRunSummary, QueuedNotification},
    services::database::Database,
    utils::startup_utils::AppState,
};

pub const CRON_TOKEN_HEADER: &str = "X-Cron-Token";

pub async fn subscribe(
    State(db): State<Arc<Database>>,
    Json(subscription): Json<PushSubscription>,
) -> Result<StatusCode, ApiError> {
    if subscription.endpoint.trim().is_empty() {
        return Err(ApiError::BadRequest("Der Push-Endpunkt fehlt".to_string()));
    }
    db.upsert_push_subscription(&subscription).await?;
    Ok(StatusCode::CREATED)
}

pub async fn get_notifications(
    Path(user_id): Path<Uuid>,
    State(db): State<Arc<Database>>,
) -> Result<Json<Vec<QueuedNotification>>, ApiError> {
    let notifications = db.read_notifications_for_user(user_id).await?;
    Ok(Json(notifications))
}

pub async fn process_queue(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<QueueRunSummary>, ApiError> {
    if let Some(secret) = state.config.cron_secret.as_deref() {
        let token = headers
            .get(CRON_TOKEN_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("");

        if token != secret {
            warn!("Unauthorized queue processing attempt");
            return Err(ApiError::Unauthorized("Ungültiges Token".to_string()));
        }
    }

    info!("Manual queue run triggered via /api/notifications/process");
    let summary = state.scheduler_controller.process_notification_queue().await?;
    Ok(Json(summary))
}
