use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{
        achievement::{Achievement, Badge},
        attribute::PlayerAttribute,
        event::{Event, EventQuery},
        notification::{NotificationStatus, PushSubscription, QueuedNotification},
        player::Player,
        template::TrainingTemplate,
        training_pool::TrainingPool,
    },
    utils::database_utils::{
        self, ATTRIBUTE_COLUMNS, EVENT_COLUMNS, NOTIFICATION_COLUMNS, TEMPLATE_COLUMNS,
    },
};

pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Database { pool }
    }

    pub async fn migrate(&self) -> Result<(), ApiError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::StartupError(format!("Failed to run migrations: {}", e)))
    }

    // MARK: Players
    pub async fn read_player(&self, id: Uuid) -> Result<Option<Player>, ApiError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, position, attendance_percentage
            FROM players
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(database_utils::map_row_to_player).transpose()
    }

    pub async fn read_players(&self, ids: &[Uuid]) -> Result<Vec<Player>, ApiError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, position, attendance_percentage
            FROM players
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(database_utils::map_row_to_player).collect()
    }

    pub async fn read_player_team_ids(&self, player_id: Uuid) -> Result<Vec<Uuid>, ApiError> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT team_id FROM team_players WHERE player_id = $1")
            .bind(player_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    pub async fn read_team_player_ids(&self, team_ids: &[Uuid]) -> Result<Vec<Uuid>, ApiError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT DISTINCT player_id FROM team_players WHERE team_id = ANY($1) ORDER BY player_id",
        )
        .bind(team_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn read_existing_team_ids(&self, team_ids: &[Uuid]) -> Result<Vec<Uuid>, ApiError> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM teams WHERE id = ANY($1)")
            .bind(team_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    pub async fn update_attendance_percentage(&self, player_id: Uuid, percentage: f64) -> Result<(), ApiError> {
        sqlx::query("UPDATE players SET attendance_percentage = $2 WHERE id = $1")
            .bind(player_id)
            .bind(percentage)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
    // MARK: Players End





    // MARK: Attributes
    pub async fn read_attributes(&self, player_id: Uuid) -> Result<Vec<PlayerAttribute>, ApiError> {
        debug!(%player_id, "[DB] read_attributes");
        let sql = format!(
            "SELECT {ATTRIBUTE_COLUMNS} FROM player_attributes WHERE player_id = $1 ORDER BY attribute_name"
        );
        let rows = sqlx::query(&sql).bind(player_id).fetch_all(&self.pool).await?;

        rows.iter().map(database_utils::map_row_to_attribute).collect()
    }

    pub async fn read_attributes_for_players(&self, player_ids: &[Uuid]) -> Result<Vec<PlayerAttribute>, ApiError> {
        let sql = format!("SELECT {ATTRIBUTE_COLUMNS} FROM player_attributes WHERE player_id = ANY($1)");
        let rows = sqlx::query(&sql).bind(player_ids).fetch_all(&self.pool).await?;

        rows.iter().map(database_utils::map_row_to_attribute).collect()
    }

    /// Loads (or creates) one attribute under a row lock, lets `apply` mutate
    /// it and writes it back in the same transaction.
    pub async fn update_attribute_locked<T, F>(
        &self,
        player_id: Uuid,
        team_id: Option<Uuid>,
        attribute_name: &str,
        apply: F,
    ) -> Result<(PlayerAttribute, T), ApiError>
    where
        F: FnOnce(&mut PlayerAttribute) -> Result<T, ApiError>,
    {
        let mut tx = self.pool.begin().await?;
        let placeholder = PlayerAttribute::new(player_id, team_id, attribute_name, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO player_attributes
            (id, player_id, team_id, attribute_name, numeric_value, sub_attributes, level, level_rating, progression_history, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (player_id, team_id, attribute_name) DO NOTHING
            "#,
        )
        .bind(placeholder.id)
        .bind(placeholder.player_id)
        .bind(placeholder.team_id)
        .bind(&placeholder.attribute_name)
        .bind(placeholder.numeric_value)
        .bind(Json(&placeholder.sub_attributes))
        .bind(placeholder.level)
        .bind(placeholder.level_rating)
        .bind(Json(&placeholder.progression_history))
        .bind(placeholder.updated_at)
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            "SELECT {ATTRIBUTE_COLUMNS} FROM player_attributes \
             WHERE player_id = $1 AND team_id IS NOT DISTINCT FROM $2 AND attribute_name = $3 \
             FOR UPDATE"
        );
        let row = sqlx::query(&sql)
            .bind(player_id)
            .bind(team_id)
            .bind(attribute_name)
            .fetch_one(&mut *tx)
            .await?;
        let mut attribute = database_utils::map_row_to_attribute(&row)?;

        let result = apply(&mut attribute)?;

        sqlx::query(
            r#"
            UPDATE player_attributes SET
                numeric_value = $2,
                sub_attributes = $3,
                level = $4,
                level_rating = $5,
                progression_history = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(attribute.id)
        .bind(attribute.numeric_value)
        .bind(Json(&attribute.sub_attributes))
        .bind(attribute.level)
        .bind(attribute.level_rating)
        .bind(Json(&attribute.progression_history))
        .bind(attribute.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(%player_id, attribute_name, "[DB] update_attribute_locked: committed");
        Ok((attribute, result))
    }
    // MARK: Attributes End





    // MARK: Events
    pub async fn insert_events(&self, events: &[Event]) -> Result<(), ApiError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for event in events {
            sqlx::query(
                r#"
                INSERT INTO events
                (id, title, event_type, description, location, start_time, end_time, team_ids,
                 invited, attending, declined, unsure, guest_players, recurring_group_id, voting_deadline,
                 auto_decline_after_deadline, deadline_processed, notification_settings, reminders_sent,
                 auto_invite, created_by, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
                "#,
            )
            .bind(event.id)
            .bind(&event.title)
            .bind(event.event_type.to_string())
            .bind(&event.description)
            .bind(&event.location)
            .bind(event.start_time)
            .bind(event.end_time)
            .bind(&event.team_ids)
            .bind(&event.invited)
            .bind(&event.attending)
            .bind(&event.declined)
            .bind(&event.unsure)
            .bind(Json(&event.guest_players))
            .bind(event.recurring_group_id)
            .bind(event.voting_deadline)
            .bind(event.auto_decline_after_deadline)
            .bind(event.deadline_processed)
            .bind(Json(&event.notification_settings))
            .bind(Json(&event.reminders_sent))
            .bind(event.auto_invite.as_ref().map(Json))
            .bind(event.created_by)
            .bind(event.created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!("[DB] insert_events: inserted {} events", events.len());
        Ok(())
    }

    pub async fn read_event(&self, id: Uuid) -> Result<Option<Event>, ApiError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;

        row.as_ref().map(database_utils::map_row_to_event).transpose()
    }

    pub async fn read_events(&self, query: &EventQuery) -> Result<Vec<Event>, ApiError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE ($1::uuid IS NULL OR $1 = ANY(team_ids)) \
               AND ($2::timestamptz IS NULL OR start_time >= $2) \
               AND ($3::timestamptz IS NULL OR start_time <= $3) \
             ORDER BY start_time"
        );
        let rows = sqlx::query(&sql)
            .bind(query.team_id)
            .bind(query.from)
            .bind(query.to)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(database_utils::map_row_to_event).collect()
    }

    /// Instances of a series starting at or after `from`.
    pub async fn read_series_ids(&self, group_id: Uuid, from: DateTime<Utc>) -> Result<Vec<Uuid>, ApiError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM events WHERE recurring_group_id = $1 AND start_time >= $2 ORDER BY start_time",
        )
        .bind(group_id)
        .bind(from)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn read_events_past_deadline(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, ApiError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM events
            WHERE auto_decline_after_deadline
              AND NOT deadline_processed
              AND voting_deadline IS NOT NULL
              AND voting_deadline <= $1
            ORDER BY voting_deadline
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn read_events_awaiting_auto_invite(&self, now: DateTime<Utc>) -> Result<Vec<Event>, ApiError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE auto_invite IS NOT NULL \
               AND (auto_invite->>'enabled')::boolean \
               AND auto_invite->>'triggeredAt' IS NULL \
               AND start_time > $1 \
             ORDER BY start_time"
        );
        let rows = sqlx::query(&sql).bind(now).fetch_all(&self.pool).await?;

        rows.iter().map(database_utils::map_row_to_event).collect()
    }

    pub async fn read_finished_events(&self, now: DateTime<Utc>) -> Result<Vec<Event>, ApiError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE end_time <= $1 ORDER BY start_time");
        let rows = sqlx::query(&sql).bind(now).fetch_all(&self.pool).await?;

        rows.iter().map(database_utils::map_row_to_event).collect()
    }

    /// Loads one event under a row lock, lets `apply` mutate it and writes it
    /// back. An error from `apply` rolls the transaction back.
    pub async fn update_event_locked<T, F>(&self, id: Uuid, apply: F) -> Result<(Event, T), ApiError>
    where
        F: FnOnce(&mut Event) -> Result<T, ApiError>,
    {
        let mut tx = self.pool.begin().await?;
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound("Termin nicht gefunden".to_string()))?;
        let mut event = database_utils::map_row_to_event(&row)?;

        let result = apply(&mut event)?;

        save_event(&mut tx, &event).await?;
        tx.commit().await?;
        Ok((event, result))
    }

    pub async fn delete_events(&self, ids: &[Uuid]) -> Result<u64, ApiError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM notification_queue WHERE event_id = ANY($1) AND status = 'pending'")
            .bind(ids)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM events WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }
    // MARK: Events End





    // MARK: Training pools
    pub async fn insert_pool(&self, pool: &TrainingPool) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO training_pools (id, name, scope, pending, approved, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(pool.id)
        .bind(&pool.name)
        .bind(Json(&pool.scope))
        .bind(&pool.pending)
        .bind(&pool.approved)
        .bind(pool.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn read_pool(&self, id: Uuid) -> Result<Option<TrainingPool>, ApiError> {
        let row = sqlx::query("SELECT id, name, scope, pending, approved, created_at FROM training_pools WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(database_utils::map_row_to_pool).transpose()
    }

    pub async fn update_pool_locked<F>(&self, id: Uuid, apply: F) -> Result<TrainingPool, ApiError>
    where
        F: FnOnce(&mut TrainingPool) -> Result<(), ApiError>,
    {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            "SELECT id, name, scope, pending, approved, created_at FROM training_pools WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Trainingspool nicht gefunden".to_string()))?;
        let mut pool = database_utils::map_row_to_pool(&row)?;

        apply(&mut pool)?;

        sqlx::query("UPDATE training_pools SET pending = $2, approved = $3 WHERE id = $1")
            .bind(pool.id)
            .bind(&pool.pending)
            .bind(&pool.approved)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(pool)
    }
    // MARK: Training pools End





    // MARK: Templates
    pub async fn insert_template(&self, template: &TrainingTemplate) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO training_templates
            (id, team_id, title, event_type, description, location, duration_minutes,
             notification_settings, auto_invite, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(template.id)
        .bind(template.team_id)
        .bind(&template.title)
        .bind(template.event_type.to_string())
        .bind(&template.description)
        .bind(&template.location)
        .bind(template.duration_minutes)
        .bind(Json(&template.notification_settings))
        .bind(template.auto_invite.as_ref().map(Json))
        .bind(template.created_by)
        .bind(template.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn read_template(&self, id: Uuid) -> Result<Option<TrainingTemplate>, ApiError> {
        let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM training_templates WHERE id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;

        row.as_ref().map(database_utils::map_row_to_template).transpose()
    }

    pub async fn read_templates(&self, team_id: Uuid) -> Result<Vec<TrainingTemplate>, ApiError> {
        let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM training_templates WHERE team_id = $1 ORDER BY title");
        let rows = sqlx::query(&sql).bind(team_id).fetch_all(&self.pool).await?;

        rows.iter().map(database_utils::map_row_to_template).collect()
    }
    // MARK: Templates End





    // MARK: Achievements
    /// Idempotent; returns only the badges that were not unlocked before.
    pub async fn insert_achievements(&self, achievements: &[Achievement]) -> Result<Vec<Badge>, ApiError> {
        let mut unlocked = Vec::new();

        for achievement in achievements {
            let result = sqlx::query(
                r#"
                INSERT INTO achievements (player_id, badge_id, description, unlocked_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (player_id, badge_id) DO NOTHING
                "#,
            )
            .bind(achievement.player_id)
            .bind(achievement.badge_id.to_string())
            .bind(&achievement.description)
            .bind(achievement.unlocked_at)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() > 0 {
                unlocked.push(achievement.badge_id);
            }
        }

        Ok(unlocked)
    }

    pub async fn read_achievements(&self, player_id: Uuid) -> Result<Vec<Achievement>, ApiError> {
        let rows = sqlx::query(
            r#"
            SELECT player_id, badge_id, description, unlocked_at
            FROM achievements
            WHERE player_id = $1
            ORDER BY unlocked_at
            "#,
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(database_utils::map_row_to_achievement).collect()
    }
    // MARK: Achievements End





    // MARK: Notifications
    pub async fn insert_notifications(&self, notifications: &[QueuedNotification]) -> Result<(), ApiError> {
        if notifications.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for n in notifications {
            sqlx::query(
                r#"
                INSERT INTO notification_queue
                (id, recipient_id, event_id, kind, title, body, scheduled_for, status, attempts, last_error, sent_at, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(n.id)
            .bind(n.recipient_id)
            .bind(n.event_id)
            .bind(Json(&n.kind))
            .bind(&n.title)
            .bind(&n.body)
            .bind(n.scheduled_for)
            .bind(n.status.to_string())
            .bind(n.attempts)
            .bind(&n.last_error)
            .bind(n.sent_at)
            .bind(n.created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!("[DB] insert_notifications: queued {}", notifications.len());
        Ok(())
    }

    pub async fn read_due_notifications(
        &self,
        now: DateTime<Utc>,
        max_attempts: i32,
        limit: i64,
    ) -> Result<Vec<QueuedNotification>, ApiError> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notification_queue \
             WHERE status = $1 AND scheduled_for <= $2 AND attempts < $3 \
             ORDER BY scheduled_for \
             LIMIT $4"
        );
        let rows = sqlx::query(&sql)
            .bind(NotificationStatus::Pending.to_string())
            .bind(now)
            .bind(max_attempts)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(database_utils::map_row_to_notification).collect()
    }

    pub async fn read_notifications_for_user(&self, user_id: Uuid) -> Result<Vec<QueuedNotification>, ApiError> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notification_queue WHERE recipient_id = $1 ORDER BY scheduled_for DESC"
        );
        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;

        rows.iter().map(database_utils::map_row_to_notification).collect()
    }

    pub async fn update_notification(&self, n: &QueuedNotification) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            UPDATE notification_queue SET
                status = $2,
                attempts = $3,
                last_error = $4,
                sent_at = $5
            WHERE id = $1
            "#,
        )
        .bind(n.id)
        .bind(n.status.to_string())
        .bind(n.attempts)
        .bind(&n.last_error)
        .bind(n.sent_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn upsert_push_subscription(&self, subscription: &PushSubscription) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO push_subscriptions (user_id, endpoint, p256dh, auth)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, endpoint) DO UPDATE SET
                p256dh = EXCLUDED.p256dh,
                auth = EXCLUDED.auth
            "#,
        )
        .bind(subscription.user_id)
        .bind(&subscription.endpoint)
        .bind(&subscription.p256dh)
        .bind(&subscription.auth)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn read_push_endpoints(&self, user_id: Uuid) -> Result<Vec<String>, ApiError> {
        let endpoints = sqlx::query_scalar::<_, String>("SELECT endpoint FROM push_subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(endpoints)
    }
    // MARK: Notifications End





    // MARK: Health Check
    pub async fn health_check(&self) -> Result<(), ApiError> {
        debug!("[DB] health_check: Starting database health check");
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ApiError::DatabaseError(format!("Health check failed: {}", e)))?;

        Ok(())
    }
    // MARK: Health Check End
}

async fn save_event(conn: &mut PgConnection, event: &Event) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        UPDATE events SET
            invited = $2,
            attending = $3,
            declined = $4,
            unsure = $5,
            guest_players = $6,
            deadline_processed = $7,
            reminders_sent = $8,
            auto_invite = $9
        WHERE id = $1
        "#,
    )
    .bind(event.id)
    .bind(&event.invited)
    .bind(&event.attending)
    .bind(&event.declined)
    .bind(&event.unsure)
    .bind(Json(&event.guest_players))
    .bind(event.deadline_processed)
    .bind(Json(&event.reminders_sent))
    .bind(event.auto_invite.as_ref().map(Json))
    .execute(conn)
    .await?;
    Ok(())
}
