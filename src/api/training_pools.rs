use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::training_pool::{CreatePoolRequest, JoinPoolRequest, TrainingPool},
    services::event_controller::EventController,
};

pub async fn create_pool(
    State(controller): State<Arc<EventController>>,
    Json(request): Json<CreatePoolRequest>,
) -> Result<(StatusCode, Json<TrainingPool>), ApiError> {
    let pool = controller.create_pool(request).await?;
    Ok((StatusCode::CREATED, Json(pool)))
}

pub async fn get_pool(
    Path(id): Path<Uuid>,
    State(controller): State<Arc<EventController>>,
) -> Result<Json<TrainingPool>, ApiError> {
    let pool = controller.require_pool(id).await?;
    Ok(Json(pool))
}

pub async fn join_pool(
    Path(id): Path<Uuid>,
    State(controller): State<Arc<EventController>>,
    Json(request): Json<JoinPoolRequest>,
) -> Result<Json<TrainingPool>, ApiError> {
    let pool = controller.join_pool(id, request.player_id).await?;
    Ok(Json(pool))
}

pub async fn approve_player(
    Path((id, player_id)): Path<(Uuid, Uuid)>,
    State(controller): State<Arc<EventController>>,
) -> Result<Json<TrainingPool>, ApiError> {
    let pool = controller.approve_pool_player(id, player_id).await?;
    Ok(Json(pool))
}

pub async fn remove_player(
    Path((id, player_id)): Path<(Uuid, Uuid)>,
    State(controller): State<Arc<EventController>>,
) -> Result<Json<TrainingPool>, ApiError> {
    let pool = controller.remove_pool_player(id, player_id).await?;
    Ok(Json(pool))
}
