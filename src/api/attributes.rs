use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::attribute::{level_table, AttributeUpdate, AttributeUpdateResponse, LevelInfo, PlayerAttribute},
    services::{overall_rating::OverallRating, rating_controller::RatingController},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamQuery {
    pub team_id: Option<Uuid>,
}

pub async fn get_levels() -> Json<Vec<LevelInfo>> {
    Json(level_table())
}

pub async fn get_attributes(
    Path(player_id): Path<Uuid>,
    Query(query): Query<TeamQuery>,
    State(controller): State<Arc<RatingController>>,
) -> Result<Json<Vec<PlayerAttribute>>, ApiError> {
    let attributes = controller.get_attributes(player_id, query.team_id).await?;
    Ok(Json(attributes))
}

pub async fn update_attribute(
    Path((player_id, attribute_name)): Path<(Uuid, String)>,
    State(controller): State<Arc<RatingController>>,
    Json(update): Json<AttributeUpdate>,
) -> Result<Json<AttributeUpdateResponse>, ApiError> {
    let response = controller.update_attribute(player_id, &attribute_name, update).await?;
    Ok(Json(response))
}

pub async fn get_overall(
    Path(player_id): Path<Uuid>,
    Query(query): Query<TeamQuery>,
    State(controller): State<Arc<RatingController>>,
) -> Result<Json<OverallRating>, ApiError> {
    let overall = controller.get_overall(player_id, query.team_id).await?;
    Ok(Json(overall))
}
