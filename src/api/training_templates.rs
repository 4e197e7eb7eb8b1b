use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{
        event::Event,
        template::{CreateTemplateRequest, InstantiateTemplateRequest, TemplateQuery, TrainingTemplate},
    },
    services::event_controller::EventController,
};

pub async fn create_template(
    State(controller): State<Arc<EventController>>,
    Json(request): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<TrainingTemplate>), ApiError> {
    let template = controller.create_template(request).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn list_templates(
    Query(query): Query<TemplateQuery>,
    State(controller): State<Arc<EventController>>,
) -> Result<Json<Vec<TrainingTemplate>>, ApiError> {
    let templates = controller.list_templates(query.team_id).await?;
    Ok(Json(templates))
}

pub async fn instantiate_template(
    Path(id): Path<Uuid>,
    State(controller): State<Arc<EventController>>,
    Json(request): Json<InstantiateTemplateRequest>,
) -> Result<(StatusCode, Json<Vec<Event>>), ApiError> {
    let events = controller.instantiate_template(id, request).await?;
    Ok((StatusCode::CREATED, Json(events)))
}
