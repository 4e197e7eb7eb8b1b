use std::{collections::BTreeMap, str::FromStr};

use sqlx::{postgres::PgRow, types::Json, Row};

use crate::{
    error::ApiError,
    models::{
        achievement::{Achievement, Badge},
        attribute::{PlayerAttribute, ProgressionEntry},
        event::{
            AutoInviteRequest, AutoInviteSettings, Event, EventType, GuestPlayer, NotificationSettings,
            ReminderLog,
        },
        notification::{NotificationKind, NotificationStatus, QueuedNotification},
        player::{Player, Position},
        template::TrainingTemplate,
        training_pool::{PoolScope, TrainingPool},
    },
};

pub const ATTRIBUTE_COLUMNS: &str = "id, player_id, team_id, attribute_name, numeric_value, sub_attributes, \
     level, level_rating, progression_history, updated_at";

pub const EVENT_COLUMNS: &str = "id, title, event_type, description, location, start_time, end_time, team_ids, \
     invited, attending, declined, unsure, guest_players, recurring_group_id, voting_deadline, \
     auto_decline_after_deadline, deadline_processed, notification_settings, reminders_sent, auto_invite, \
     created_by, created_at";

pub const NOTIFICATION_COLUMNS: &str = "id, recipient_id, event_id, kind, title, body, scheduled_for, status, \
     attempts, last_error, sent_at, created_at";

pub const TEMPLATE_COLUMNS: &str = "id, team_id, title, event_type, description, location, duration_minutes, \
     notification_settings, auto_invite, created_by, created_at";

fn parse_text<T>(row: &PgRow, column: &str) -> Result<T, ApiError>
where
    T: FromStr,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>()
        .map_err(|_| ApiError::InternalConversionError(format!("Unknown value '{}' in column {}", raw, column)))
}

pub fn map_row_to_player(row: &PgRow) -> Result<Player, ApiError> {
    Ok(Player {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        position: parse_text::<Position>(row, "position")?,
        attendance_percentage: row.try_get("attendance_percentage")?,
    })
}

pub fn map_row_to_attribute(row: &PgRow) -> Result<PlayerAttribute, ApiError> {
    let sub_attributes: Json<BTreeMap<String, i32>> = row.try_get("sub_attributes")?;
    let progression_history: Json<Vec<ProgressionEntry>> = row.try_get("progression_history")?;

    Ok(PlayerAttribute {
        id: row.try_get("id")?,
        player_id: row.try_get("player_id")?,
        team_id: row.try_get("team_id")?,
        attribute_name: row.try_get("attribute_name")?,
        numeric_value: row.try_get("numeric_value")?,
        sub_attributes: sub_attributes.0,
        level: row.try_get("level")?,
        level_rating: row.try_get("level_rating")?,
        progression_history: progression_history.0,
        updated_at: row.try_get("updated_at")?,
    })
}

pub fn map_row_to_event(row: &PgRow) -> Result<Event, ApiError> {
    let guest_players: Json<Vec<GuestPlayer>> = row.try_get("guest_players")?;
    let notification_settings: Json<NotificationSettings> = row.try_get("notification_settings")?;
    let reminders_sent: Json<Vec<ReminderLog>> = row.try_get("reminders_sent")?;
    let auto_invite: Option<Json<AutoInviteSettings>> = row.try_get("auto_invite")?;

    Ok(Event {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        event_type: parse_text::<EventType>(row, "event_type")?,
        description: row.try_get("description")?,
        location: row.try_get("location")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        team_ids: row.try_get("team_ids")?,
        invited: row.try_get("invited")?,
        attending: row.try_get("attending")?,
        declined: row.try_get("declined")?,
        unsure: row.try_get("unsure")?,
        guest_players: guest_players.0,
        recurring_group_id: row.try_get("recurring_group_id")?,
        voting_deadline: row.try_get("voting_deadline")?,
        auto_decline_after_deadline: row.try_get("auto_decline_after_deadline")?,
        deadline_processed: row.try_get("deadline_processed")?,
        notification_settings: notification_settings.0,
        reminders_sent: reminders_sent.0,
        auto_invite: auto_invite.map(|json| json.0),
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
    })
}

pub fn map_row_to_pool(row: &PgRow) -> Result<TrainingPool, ApiError> {
    let scope: Json<PoolScope> = row.try_get("scope")?;

    Ok(TrainingPool {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        scope: scope.0,
        pending: row.try_get("pending")?,
        approved: row.try_get("approved")?,
        created_at: row.try_get("created_at")?,
    })
}

pub fn map_row_to_template(row: &PgRow) -> Result<TrainingTemplate, ApiError> {
    let notification_settings: Json<NotificationSettings> = row.try_get("notification_settings")?;
    let auto_invite: Option<Json<AutoInviteRequest>> = row.try_get("auto_invite")?;

    Ok(TrainingTemplate {
        id: row.try_get("id")?,
        team_id: row.try_get("team_id")?,
        title: row.try_get("title")?,
        event_type: parse_text::<EventType>(row, "event_type")?,
        description: row.try_get("description")?,
        location: row.try_get("location")?,
        duration_minutes: row.try_get("duration_minutes")?,
        notification_settings: notification_settings.0,
        auto_invite: auto_invite.map(|json| json.0),
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
    })
}

pub fn map_row_to_notification(row: &PgRow) -> Result<QueuedNotification, ApiError> {
    let kind: Json<NotificationKind> = row.try_get("kind")?;

    Ok(QueuedNotification {
        id: row.try_get("id")?,
        recipient_id: row.try_get("recipient_id")?,
        event_id: row.try_get("event_id")?,
        kind: kind.0,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        scheduled_for: row.try_get("scheduled_for")?,
        status: parse_text::<NotificationStatus>(row, "status")?,
        attempts: row.try_get("attempts")?,
        last_error: row.try_get("last_error")?,
        sent_at: row.try_get("sent_at")?,
        created_at: row.try_get("created_at")?,
    })
}

pub fn map_row_to_achievement(row: &PgRow) -> Result<Achievement, ApiError> {
    Ok(Achievement {
        player_id: row.try_get("player_id")?,
        badge_id: parse_text::<Badge>(row, "badge_id")?,
        description: row.try_get("description")?,
        unlocked_at: row.try_get("unlocked_at")?,
    })
}
