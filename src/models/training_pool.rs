use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PoolScope {
    /// Open to players whose average league level reaches `min_level`.
    #[serde(rename_all = "camelCase")]
    League { min_level: i32 },
    /// Open to members of one team.
    #[serde(rename_all = "camelCase")]
    Team { team_id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPool {
    pub id: Uuid,
    pub name: String,
    pub scope: PoolScope,
    pub pending: Vec<Uuid>,
    pub approved: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoolRequest {
    pub name: String,
    pub scope: PoolScope,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPoolRequest {
    pub player_id: Uuid,
}
