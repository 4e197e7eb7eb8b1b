use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Attempts after which a queued notification is given up.
pub const MAX_ATTEMPTS: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NotificationKind {
    Reminder { hours: u32 },
    DeadlineReminder { hours: u32 },
    AutoInvite,
    AutoDeclined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedNotification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub event_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub scheduled_for: DateTime<Utc>,
    pub status: NotificationStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl QueuedNotification {
    pub fn new(
        recipient_id: Uuid,
        event_id: Option<Uuid>,
        kind: NotificationKind,
        title: String,
        body: String,
        scheduled_for: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        QueuedNotification {
            id: Uuid::new_v4(),
            recipient_id,
            event_id,
            kind,
            title,
            body,
            scheduled_for,
            status: NotificationStatus::Pending,
            attempts: 0,
            last_error: None,
            sent_at: None,
            created_at: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == NotificationStatus::Pending
            && self.scheduled_for <= now
            && self.attempts < MAX_ATTEMPTS
    }

    pub fn mark_sent(&mut self, now: DateTime<Utc>) {
        self.status = NotificationStatus::Sent;
        self.sent_at = Some(now);
        self.last_error = None;
    }

    /// Counts a failed attempt; the entry stays pending until the cap is hit.
    pub fn mark_failed(&mut self, error: &str) {
        self.attempts += 1;
        self.last_error = Some(error.to_string());
        if self.attempts >= MAX_ATTEMPTS {
            self.status = NotificationStatus::Failed;
        }
    }

    pub fn mark_skipped(&mut self, reason: &str) {
        self.status = NotificationStatus::Skipped;
        self.last_error = Some(reason.to_string());
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub user_id: Uuid,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRunSummary {
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}
