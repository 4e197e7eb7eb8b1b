use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::event::{AddGuestRequest, CreateEventRequest, DeleteQuery, Event, EventQuery, RsvpRequest},
    services::event_controller::EventController,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub deleted: u64,
}

pub async fn create_event(
    State(controller): State<Arc<EventController>>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Vec<Event>>), ApiError> {
    let events = controller.create_event(request).await?;
    Ok((StatusCode::CREATED, Json(events)))
}

pub async fn list_events(
    Query(query): Query<EventQuery>,
    State(controller): State<Arc<EventController>>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let events = controller.list_events(query).await?;
    Ok(Json(events))
}

pub async fn get_event(
    Path(id): Path<Uuid>,
    State(controller): State<Arc<EventController>>,
) -> Result<Json<Event>, ApiError> {
    let event = controller.get_event(id).await?;
    Ok(Json(event))
}

pub async fn delete_event(
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteQuery>,
    State(controller): State<Arc<EventController>>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = controller.delete_event(id, query.scope).await?;
    Ok(Json(DeleteResponse { deleted }))
}

pub async fn respond(
    Path(id): Path<Uuid>,
    State(controller): State<Arc<EventController>>,
    Json(request): Json<RsvpRequest>,
) -> Result<Json<Event>, ApiError> {
    let event = controller.respond(id, request).await?;
    Ok(Json(event))
}

pub async fn add_guest(
    Path(id): Path<Uuid>,
    State(controller): State<Arc<EventController>>,
    Json(request): Json<AddGuestRequest>,
) -> Result<Json<Event>, ApiError> {
    let event = controller.add_guest(id, request).await?;
    Ok(Json(event))
}
