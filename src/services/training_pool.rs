/*
Membership rules for training pools.
*/

use uuid::Uuid;

use crate::{
    error::ApiError,
    models::training_pool::{PoolScope, TrainingPool},
};

/// What is known about a player when they ask to join a pool.
#[derive(Debug, Clone, Default)]
pub struct PlayerQualification {
    pub average_level: Option<f64>,
    pub team_ids: Vec<Uuid>,
}

pub fn qualifies(pool: &TrainingPool, qualification: &PlayerQualification) -> bool {
    match &pool.scope {
        PoolScope::League { min_level } => qualification
            .average_level
            .is_some_and(|level| level.round() as i32 >= *min_level),
        PoolScope::Team { team_id } => qualification.team_ids.contains(team_id),
    }
}

pub fn request_join(
    pool: &mut TrainingPool,
    player_id: Uuid,
    qualification: &PlayerQualification,
) -> Result<(), ApiError> {
    if pool.approved.contains(&player_id) || pool.pending.contains(&player_id) {
        return Err(ApiError::BadRequest(
            "Der Spieler ist bereits im Pool oder angefragt".to_string(),
        ));
    }
    if !qualifies(pool, qualification) {
        return Err(ApiError::Forbidden(
            "Der Spieler erfüllt die Voraussetzungen für diesen Pool nicht".to_string(),
        ));
    }
    pool.pending.push(player_id);
    Ok(())
}

pub fn approve(pool: &mut TrainingPool, player_id: Uuid) -> Result<(), ApiError> {
    let Some(index) = pool.pending.iter().position(|p| *p == player_id) else {
        return Err(ApiError::NotFound(
            "Keine offene Anfrage für diesen Spieler".to_string(),
        ));
    };
    pool.pending.remove(index);
    pool.approved.push(player_id);
    Ok(())
}

pub fn remove(pool: &mut TrainingPool, player_id: Uuid) -> Result<(), ApiError> {
    let before = pool.pending.len() + pool.approved.len();
    pool.pending.retain(|p| *p != player_id);
    pool.approved.retain(|p| *p != player_id);
    if pool.pending.len() + pool.approved.len() == before {
        return Err(ApiError::NotFound("Der Spieler ist nicht im Pool".to_string()));
    }
    Ok(())
}
