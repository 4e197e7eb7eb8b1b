use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::attribute::{LeagueLevel, ProgressionEntry};
use crate::services::overall_rating::OverallRating;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeProgress {
    pub attribute_name: String,
    pub universal: bool,
    pub level: i32,
    pub league: LeagueLevel,
    pub value: i32,
    pub total_change: i32,
    pub promotions: usize,
    pub history: Vec<ProgressionEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub player_id: Uuid,
    pub team_id: Option<Uuid>,
    pub overall: Option<OverallRating>,
    pub attributes: Vec<AttributeProgress>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    pub team_id: Option<Uuid>,
    pub since: Option<DateTime<Utc>>,
}
