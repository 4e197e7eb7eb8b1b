use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{
        achievement::Achievement,
        attribute::PlayerAttribute,
        event::{Event, ReminderLog},
        notification::{NotificationStatus, QueueRunSummary, QueuedNotification, MAX_ATTEMPTS},
    },
    services::{
        achievements, attendance,
        auto_invite::{self, PoolCandidate},
        database::Database,
        notification_queue,
        notifier::PushNotifier,
        overall_rating::{compute_overall, effective_attributes},
    },
};

const QUEUE_BATCH_SIZE: i64 = 200;

/// Background work driven by the cron jobs: sending due notifications,
/// closing voting deadlines and recomputing attendance.
pub struct SchedulerController {
    db: Arc<Database>,
    notifier: PushNotifier,
    timezone: Tz,
}

impl SchedulerController {
    pub fn new(db: Arc<Database>, notifier: PushNotifier, timezone: Tz) -> Self {
        SchedulerController {
            db,
            notifier,
            timezone,
        }
    }

    // MARK: Notification queue
    pub async fn process_notification_queue(&self) -> Result<QueueRunSummary, ApiError> {
        let now = Utc::now();
        let due = self.db.read_due_notifications(now, MAX_ATTEMPTS, QUEUE_BATCH_SIZE).await?;
        let mut summary = QueueRunSummary::default();

        for mut notification in due.into_iter().filter(|n| n.is_due(now)) {
            summary.processed += 1;
            if let Err(e) = self.process_notification(&mut notification, now).await {
                error!(id = %notification.id, "[SCHEDULER]: notification processing failed: {}", e);
            }
            match notification.status {
                NotificationStatus::Sent => summary.sent += 1,
                NotificationStatus::Skipped => summary.skipped += 1,
                _ if notification.last_error.is_some() => summary.failed += 1,
                _ => {}
            }
        }

        if summary.processed > 0 {
            info!(
                "[SCHEDULER]: notification queue processed {} (sent {}, failed {}, skipped {})",
                summary.processed, summary.sent, summary.failed, summary.skipped
            );
        }
        Ok(summary)
    }

    async fn process_notification(&self, notification: &mut QueuedNotification, now: DateTime<Utc>) -> Result<(), ApiError> {
        let event = match notification.event_id {
            Some(event_id) => self.db.read_event(event_id).await?,
            None => None,
        };

        if let Some(reason) = notification_queue::skip_reason(notification, event.as_ref(), now) {
            debug!(id = %notification.id, reason, "[SCHEDULER]: notification skipped");
            notification.mark_skipped(reason);
            return self.db.update_notification(notification).await;
        }

        match self.notifier.deliver(notification).await {
            Ok(_) => notification.mark_sent(now),
            Err(e) => {
                warn!(id = %notification.id, attempt = notification.attempts + 1, "[SCHEDULER]: delivery failed: {}", e);
                notification.mark_failed(&e.to_string());
            }
        }
        self.db.update_notification(notification).await?;

        if let (Some(event_id), Some(reminder)) = (
            notification.event_id,
            notification_queue::reminder_log_kind(notification.kind),
        ) {
            if notification.sent_at.is_some() {
                self.db
                    .update_event_locked(event_id, |event| {
                        if !event.reminder_sent(reminder) {
                            event.reminders_sent.push(ReminderLog { reminder, sent_at: now });
                        }
                        Ok(())
                    })
                    .await?;
            }
        }

        Ok(())
    }
    // MARK: Notification queue End





    // MARK: Voting deadlines
    pub async fn process_voting_deadlines(&self) -> Result<(), ApiError> {
        let now = Utc::now();

        let expired = self.db.read_events_past_deadline(now).await?;
        let mut declined_total = 0;
        for event_id in expired {
            match self.close_deadline(event_id, now).await {
                Ok(count) => declined_total += count,
                Err(e) => error!(%event_id, "[SCHEDULER]: auto-decline failed: {}", e),
            }
        }

        let candidates = self.db.read_events_awaiting_auto_invite(now).await?;
        let mut invited_total = 0;
        for event in candidates.iter().filter(|e| auto_invite::trigger_reached(e, now)) {
            match self.run_auto_invite(event, now).await {
                Ok(count) => invited_total += count,
                Err(e) => error!(event_id = %event.id, "[SCHEDULER]: auto-invite failed: {}", e),
            }
        }

        if declined_total > 0 || invited_total > 0 {
            info!(
                "[SCHEDULER]: voting deadlines processed, {} auto-declined, {} invited from pools",
                declined_total, invited_total
            );
        }
        Ok(())
    }

    async fn close_deadline(&self, event_id: Uuid, now: DateTime<Utc>) -> Result<usize, ApiError> {
        let (event, declined) = self
            .db
            .update_event_locked(event_id, |event| Ok(attendance::auto_decline(event, now)))
            .await?;

        let entries = notification_queue::auto_declined_entries(&event, &declined, now, self.timezone);
        self.db.insert_notifications(&entries).await?;
        Ok(declined.len())
    }

    async fn run_auto_invite(&self, event: &Event, now: DateTime<Utc>) -> Result<usize, ApiError> {
        let Some(settings) = event.auto_invite.as_ref() else {
            return Ok(0);
        };

        let candidates = match self.db.read_pool(settings.pool_id).await? {
            Some(pool) => {
                let eligible = auto_invite::eligible_players(&pool, event);
                self.pool_candidates(&eligible, event.team_ids.first().copied()).await?
            }
            None => {
                warn!(event_id = %event.id, pool_id = %settings.pool_id, "[SCHEDULER]: training pool no longer exists");
                Vec::new()
            }
        };

        // re-checked under the row lock, a parallel run may have evaluated it already
        let (event, invited) = self
            .db
            .update_event_locked(event.id, |locked| {
                if !auto_invite::trigger_reached(locked, now) {
                    return Ok(Vec::new());
                }
                let open: Vec<PoolCandidate> = candidates
                    .into_iter()
                    .filter(|c| !locked.is_participant(c.player_id))
                    .collect();
                let chosen: Vec<Uuid> = auto_invite::select_candidates(open, auto_invite::open_slots(locked))
                    .into_iter()
                    .map(|c| c.player_id)
                    .collect();
                auto_invite::record_invites(locked, &chosen, now);
                Ok(chosen)
            })
            .await?;

        let entries = notification_queue::auto_invite_entries(&event, &invited, now, self.timezone);
        self.db.insert_notifications(&entries).await?;
        Ok(invited.len())
    }

    async fn pool_candidates(&self, players: &[Uuid], team_id: Option<Uuid>) -> Result<Vec<PoolCandidate>, ApiError> {
        if players.is_empty() {
            return Ok(Vec::new());
        }

        let mut attributes_by_player: HashMap<Uuid, Vec<PlayerAttribute>> = HashMap::new();
        for attribute in self.db.read_attributes_for_players(players).await? {
            attributes_by_player.entry(attribute.player_id).or_default().push(attribute);
        }

        let candidates = self
            .db
            .read_players(players)
            .await?
            .into_iter()
            .map(|player| {
                let attributes = attributes_by_player.get(&player.id).map(Vec::as_slice).unwrap_or(&[]);
                let overall = compute_overall(&effective_attributes(attributes, team_id), player.position);
                PoolCandidate {
                    player_id: player.id,
                    overall: overall.map(|o| o.value),
                    attendance_percentage: player.attendance_percentage,
                }
            })
            .collect();

        Ok(candidates)
    }
    // MARK: Voting deadlines End





    // MARK: Attendance
    pub async fn process_attendance(&self) -> Result<(), ApiError> {
        let now = Utc::now();
        let events = self.db.read_finished_events(now).await?;
        let stats = attendance::attendance_by_player(&events, now);

        let mut updated = 0;
        for (player_id, player_stats) in &stats {
            let result = self.store_attendance(*player_id, player_stats, now).await;
            match result {
                Ok(()) => updated += 1,
                Err(e) => error!(%player_id, "[SCHEDULER]: attendance update failed: {}", e),
            }
        }

        info!(
            "[SCHEDULER]: attendance recomputed for {} of {} players over {} events",
            updated,
            stats.len(),
            events.len()
        );
        Ok(())
    }

    async fn store_attendance(
        &self,
        player_id: Uuid,
        stats: &attendance::AttendanceStats,
        now: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        self.db.update_attendance_percentage(player_id, stats.percentage()).await?;

        let earned: Vec<Achievement> = achievements::attendance_badges(stats)
            .into_iter()
            .map(|badge| Achievement::new(player_id, badge, now))
            .collect();
        let unlocked = self.db.insert_achievements(&earned).await?;
        if !unlocked.is_empty() {
            info!(%player_id, ?unlocked, "[SCHEDULER]: attendance badges unlocked");
        }
        Ok(())
    }
    // MARK: Attendance End
}
