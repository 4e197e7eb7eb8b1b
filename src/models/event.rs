/*
Events (trainings, games) together with everything the scheduler keeps on them.
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum EventType {
    Training,
    Spiel,
    Sonstiges,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Accepted,
    Declined,
    Unsure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestPlayer {
    pub player_id: Uuid,
    pub from_team_id: Option<Uuid>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub enabled: bool,
    pub reminder_hours_before: Vec<u32>,
    pub deadline_reminder_hours: Option<u32>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            enabled: true,
            reminder_hours_before: vec![24],
            deadline_reminder_hours: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReminderKind {
    BeforeStart { hours: u32 },
    BeforeDeadline { hours: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderLog {
    pub reminder: ReminderKind,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AutoInviteTrigger {
    AtDeadline,
    HoursBefore { hours: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoInviteSettings {
    pub enabled: bool,
    pub pool_id: Uuid,
    pub min_participants: u32,
    pub trigger: AutoInviteTrigger,
    /// Set once the trigger has been evaluated; the check never runs twice.
    pub triggered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub invited_from_pool: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoInviteRequest {
    pub pool_id: Uuid,
    pub min_participants: u32,
    pub trigger: AutoInviteTrigger,
}

impl AutoInviteRequest {
    pub fn into_settings(self) -> AutoInviteSettings {
        AutoInviteSettings {
            enabled: true,
            pool_id: self.pool_id,
            min_participants: self.min_participants,
            trigger: self.trigger,
            triggered_at: None,
            invited_from_pool: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceFrequency {
    Weekly,
    Biweekly,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrencePattern {
    pub frequency: RecurrenceFrequency,
    pub until: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub event_type: EventType,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub team_ids: Vec<Uuid>,
    pub invited: Vec<Uuid>,
    pub attending: Vec<Uuid>,
    pub declined: Vec<Uuid>,
    pub unsure: Vec<Uuid>,
    pub guest_players: Vec<GuestPlayer>,
    pub recurring_group_id: Option<Uuid>,
    pub voting_deadline: Option<DateTime<Utc>>,
    pub auto_decline_after_deadline: bool,
    pub deadline_processed: bool,
    pub notification_settings: NotificationSettings,
    pub reminders_sent: Vec<ReminderLog>,
    pub auto_invite: Option<AutoInviteSettings>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn is_guest(&self, player_id: Uuid) -> bool {
        self.guest_players.iter().any(|g| g.player_id == player_id)
    }

    /// Invited players and guests may both answer.
    pub fn is_participant(&self, player_id: Uuid) -> bool {
        self.invited.contains(&player_id) || self.is_guest(player_id)
    }

    pub fn participants(&self) -> Vec<Uuid> {
        let mut all = self.invited.clone();
        for guest in &self.guest_players {
            if !all.contains(&guest.player_id) {
                all.push(guest.player_id);
            }
        }
        all
    }

    pub fn response_of(&self, player_id: Uuid) -> Option<ResponseStatus> {
        if self.attending.contains(&player_id) {
            Some(ResponseStatus::Accepted)
        } else if self.declined.contains(&player_id) {
            Some(ResponseStatus::Declined)
        } else if self.unsure.contains(&player_id) {
            Some(ResponseStatus::Unsure)
        } else {
            None
        }
    }

    /// Participants who have not answered yet.
    pub fn pending_players(&self) -> Vec<Uuid> {
        self.participants()
            .into_iter()
            .filter(|p| self.response_of(*p).is_none())
            .collect()
    }

    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        self.voting_deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_time <= now
    }

    pub fn reminder_sent(&self, reminder: ReminderKind) -> bool {
        self.reminders_sent.iter().any(|log| log.reminder == reminder)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub event_type: EventType,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub team_ids: Vec<Uuid>,
    /// Empty means "the whole roster of `team_ids`".
    #[serde(default)]
    pub invited: Vec<Uuid>,
    pub created_by: Uuid,
    pub voting_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub auto_decline_after_deadline: bool,
    pub notification_settings: Option<NotificationSettings>,
    pub auto_invite: Option<AutoInviteRequest>,
    pub recurrence: Option<RecurrencePattern>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpRequest {
    pub player_id: Uuid,
    pub status: ResponseStatus,
    /// Also answer every later instance of the same series.
    #[serde(default)]
    pub apply_to_series: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddGuestRequest {
    pub player_id: Uuid,
    pub from_team_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventQuery {
    pub team_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteScope {
    #[default]
    Single,
    Series,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub scope: DeleteScope,
}
