use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::progress::{ProgressQuery, ProgressReport},
    services::rating_controller::RatingController,
};

pub async fn get_progress(
    Path(player_id): Path<Uuid>,
    Query(query): Query<ProgressQuery>,
    State(controller): State<Arc<RatingController>>,
) -> Result<Json<ProgressReport>, ApiError> {
    let report = controller.get_progress(player_id, query).await?;
    Ok(Json(report))
}
