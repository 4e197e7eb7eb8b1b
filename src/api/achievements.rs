use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{error::ApiError, models::achievement::Achievement, services::rating_controller::RatingController};

pub async fn get_achievements(
    Path(player_id): Path<Uuid>,
    State(controller): State<Arc<RatingController>>,
) -> Result<Json<Vec<Achievement>>, ApiError> {
    let achievements = controller.get_achievements(player_id).await?;
    Ok(Json(achievements))
}
