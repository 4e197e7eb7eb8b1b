use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{
        achievement::{Achievement, Badge},
        attribute::{AttributeUpdate, AttributeUpdateResponse, PlayerAttribute},
        player::Player,
        progress::{ProgressQuery, ProgressReport},
    },
    services::{
        achievements,
        database::Database,
        overall_rating::{compute_overall, effective_attributes, OverallRating},
        progress, rating_engine,
    },
};

pub struct RatingController {
    db: Arc<Database>,
}

impl RatingController {
    pub fn new(db: Arc<Database>) -> Self {
        RatingController { db }
    }

    async fn require_player(&self, player_id: Uuid) -> Result<Player, ApiError> {
        self.db
            .read_player(player_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Spieler nicht gefunden".to_string()))
    }

    async fn require_team(&self, team_id: Uuid) -> Result<(), ApiError> {
        if self.db.read_existing_team_ids(&[team_id]).await?.contains(&team_id) {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("Team {} nicht gefunden", team_id)))
        }
    }

    pub async fn update_attribute(
        &self,
        player_id: Uuid,
        attribute_name: &str,
        update: AttributeUpdate,
    ) -> Result<AttributeUpdateResponse, ApiError> {
        let attribute_name = attribute_name.trim();
        if attribute_name.is_empty() {
            return Err(ApiError::BadRequest("Der Name der Fähigkeit fehlt".to_string()));
        }
        let player = self.require_player(player_id).await?;
        if let Some(team_id) = update.team_id {
            self.require_team(team_id).await?;
        }

        let now = Utc::now();
        let (attribute, outcome) = self
            .db
            .update_attribute_locked(player_id, update.team_id, attribute_name, |attribute| {
                rating_engine::apply_update(attribute, &update, now)
            })
            .await?;

        info!(
            %player_id,
            attribute = attribute_name,
            ?outcome,
            "[RATING_CONTROLLER]: attribute updated"
        );

        let unlocked_badges = self.unlock_rating_badges(&player, update.team_id).await;

        Ok(AttributeUpdateResponse {
            attribute,
            outcome,
            unlocked_badges,
        })
    }

    /// Runs after the rating is committed, so a failure is logged and reported
    /// as no new badges instead of failing the update.
    async fn unlock_rating_badges(&self, player: &Player, team_id: Option<Uuid>) -> Vec<Badge> {
        match self.try_unlock_rating_badges(player, team_id).await {
            Ok(unlocked) => unlocked,
            Err(e) => {
                warn!(player_id = %player.id, "[RATING_CONTROLLER]: badge evaluation failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_unlock_rating_badges(&self, player: &Player, team_id: Option<Uuid>) -> Result<Vec<Badge>, ApiError> {
        let attributes = self.db.read_attributes(player.id).await?;
        let overall = compute_overall(&effective_attributes(&attributes, team_id), player.position);

        let now = Utc::now();
        let earned: Vec<Achievement> = achievements::rating_badges(&attributes, overall.as_ref())
            .into_iter()
            .map(|badge| Achievement::new(player.id, badge, now))
            .collect();

        let unlocked = self.db.insert_achievements(&earned).await?;
        if !unlocked.is_empty() {
            info!(player_id = %player.id, ?unlocked, "[RATING_CONTROLLER]: badges unlocked");
        }
        Ok(unlocked)
    }

    pub async fn get_attributes(&self, player_id: Uuid, team_id: Option<Uuid>) -> Result<Vec<PlayerAttribute>, ApiError> {
        self.require_player(player_id).await?;
        let attributes = self.db.read_attributes(player_id).await?;

        Ok(attributes
            .into_iter()
            .filter(|a| a.team_id.is_none() || a.team_id == team_id)
            .collect())
    }

    pub async fn get_overall(&self, player_id: Uuid, team_id: Option<Uuid>) -> Result<OverallRating, ApiError> {
        let player = self.require_player(player_id).await?;
        let attributes = self.db.read_attributes(player_id).await?;
        debug!(%player_id, count = attributes.len(), "[RATING_CONTROLLER]: computing overall");

        compute_overall(&effective_attributes(&attributes, team_id), player.position).ok_or_else(|| {
            ApiError::NotFound("Für diesen Spieler liegen noch keine Bewertungen vor".to_string())
        })
    }

    pub async fn get_progress(&self, player_id: Uuid, query: ProgressQuery) -> Result<ProgressReport, ApiError> {
        let player = self.require_player(player_id).await?;
        let attributes = self.db.read_attributes(player_id).await?;

        Ok(progress::build_report(
            player_id,
            query.team_id,
            player.position,
            &attributes,
            query.since,
        ))
    }

    pub async fn get_achievements(&self, player_id: Uuid) -> Result<Vec<Achievement>, ApiError> {
        self.require_player(player_id).await?;
        self.db.read_achievements(player_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::models::player::Position;

    fn unreachable_controller() -> RatingController {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://volleyteam@127.0.0.1:1/volleyteam")
            .unwrap();
        RatingController::new(Arc::new(Database::new(pool)))
    }

    #[tokio::test]
    async fn badge_lookup_failure_yields_no_badges() {
        let controller = unreachable_controller();
        let player = Player {
            id: Uuid::new_v4(),
            name: "Lena".to_string(),
            position: Position::Libero,
            attendance_percentage: 0.0,
        };

        assert!(controller.try_unlock_rating_badges(&player, None).await.is_err());
        assert!(controller.unlock_rating_badges(&player, None).await.is_empty());
    }
}
