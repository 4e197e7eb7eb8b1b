/*
Builds queue entries for event reminders and decides which due entries are
still worth sending.
*/

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::models::{
    event::{Event, ReminderKind, ResponseStatus},
    notification::{NotificationKind, QueuedNotification},
};

pub fn format_start(event: &Event, tz: Tz) -> String {
    event
        .start_time
        .with_timezone(&tz)
        .format("%d.%m.%Y um %H:%M Uhr")
        .to_string()
}

/// Reminder and deadline-reminder entries for all participants, skipping
/// offsets that already lie in the past.
pub fn reminder_entries(event: &Event, now: DateTime<Utc>, tz: Tz) -> Vec<QueuedNotification> {
    let settings = &event.notification_settings;
    if !settings.enabled {
        return Vec::new();
    }

    let participants = event.participants();
    let when = format_start(event, tz);
    let mut entries = Vec::new();

    let mut hours_before = settings.reminder_hours_before.clone();
    hours_before.sort_unstable();
    hours_before.dedup();

    for hours in hours_before {
        let scheduled_for = event.start_time - Duration::hours(i64::from(hours));
        if scheduled_for <= now {
            continue;
        }
        for player in &participants {
            entries.push(QueuedNotification::new(
                *player,
                Some(event.id),
                NotificationKind::Reminder { hours },
                format!("Erinnerung: {}", event.title),
                format!("{} am {}", event.event_type, when),
                scheduled_for,
                now,
            ));
        }
    }

    if let (Some(hours), Some(deadline)) = (settings.deadline_reminder_hours, event.voting_deadline) {
        let scheduled_for = deadline - Duration::hours(i64::from(hours));
        if scheduled_for > now {
            for player in &participants {
                entries.push(QueuedNotification::new(
                    *player,
                    Some(event.id),
                    NotificationKind::DeadlineReminder { hours },
                    format!("Bitte abstimmen: {}", event.title),
                    format!("Die Abstimmung für {} am {} endet bald", event.event_type, when),
                    scheduled_for,
                    now,
                ));
            }
        }
    }

    entries
}

pub fn auto_invite_entries(event: &Event, players: &[Uuid], now: DateTime<Utc>, tz: Tz) -> Vec<QueuedNotification> {
    let when = format_start(event, tz);
    players
        .iter()
        .map(|player| {
            QueuedNotification::new(
                *player,
                Some(event.id),
                NotificationKind::AutoInvite,
                format!("Einladung: {}", event.title),
                format!("Es fehlen noch Spieler für {} am {}. Bist du dabei?", event.event_type, when),
                now,
                now,
            )
        })
        .collect()
}

pub fn auto_declined_entries(event: &Event, players: &[Uuid], now: DateTime<Utc>, tz: Tz) -> Vec<QueuedNotification> {
    let when = format_start(event, tz);
    players
        .iter()
        .map(|player| {
            QueuedNotification::new(
                *player,
                Some(event.id),
                NotificationKind::AutoDeclined,
                format!("Abgemeldet: {}", event.title),
                format!("Du hast nicht rechtzeitig abgestimmt und wurdest für {} am {} abgemeldet", event.event_type, when),
                now,
                now,
            )
        })
        .collect()
}

/// Reason to drop a due entry instead of sending it, if any.
pub fn skip_reason(notification: &QueuedNotification, event: Option<&Event>, now: DateTime<Utc>) -> Option<&'static str> {
    let event_id = notification.event_id?;
    let Some(event) = event.filter(|e| e.id == event_id) else {
        return Some("Termin existiert nicht mehr");
    };

    let recipient = notification.recipient_id;
    match notification.kind {
        NotificationKind::Reminder { .. } => {
            if event.start_time <= now {
                Some("Termin hat bereits begonnen")
            } else if !event.is_participant(recipient) {
                Some("Empfänger ist nicht mehr eingeladen")
            } else if event.response_of(recipient) == Some(ResponseStatus::Declined) {
                Some("Empfänger hat abgesagt")
            } else {
                None
            }
        }
        NotificationKind::DeadlineReminder { .. } => {
            if event.deadline_passed(now) {
                Some("Abstimmungsfrist ist abgelaufen")
            } else if event.response_of(recipient).is_some() {
                Some("Empfänger hat bereits abgestimmt")
            } else {
                None
            }
        }
        NotificationKind::AutoInvite | NotificationKind::AutoDeclined => None,
    }
}

/// Entry for the event's reminders-sent log, for kinds that have one.
pub fn reminder_log_kind(kind: NotificationKind) -> Option<ReminderKind> {
    match kind {
        NotificationKind::Reminder { hours } => Some(ReminderKind::BeforeStart { hours }),
        NotificationKind::DeadlineReminder { hours } => Some(ReminderKind::BeforeDeadline { hours }),
        NotificationKind::AutoInvite | NotificationKind::AutoDeclined => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::event::{EventType, NotificationSettings};

    fn event(now: DateTime<Utc>, invited: Vec<Uuid>) -> Event {
        let start = Utc.with_ymd_and_hms(2026, 11, 10, 17, 30, 0).unwrap();
        Event {
            id: Uuid::new_v4(),
            title: "Training".to_string(),
            event_type: EventType::Training,
            description: None,
            location: None,
            start_time: start,
            end_time: start + Duration::hours(2),
            team_ids: Vec::new(),
            invited,
            attending: Vec::new(),
            declined: Vec::new(),
            unsure: Vec::new(),
            guest_players: Vec::new(),
            recurring_group_id: None,
            voting_deadline: Some(start - Duration::hours(48)),
            auto_decline_after_deadline: true,
            deadline_processed: false,
            notification_settings: NotificationSettings {
                enabled: true,
                reminder_hours_before: vec![24, 2, 24],
                deadline_reminder_hours: Some(12),
            },
            reminders_sent: Vec::new(),
            auto_invite: None,
            created_by: Uuid::new_v4(),
            created_at: now,
        }
    }

    #[test]
    fn start_is_formatted_in_local_time() {
        let e = event(Utc::now(), Vec::new());
        // 17:30 UTC is 18:30 in Berlin during winter time
        assert_eq!(format_start(&e, chrono_tz::Europe::Berlin), "10.11.2026 um 18:30 Uhr");
    }

    #[test]
    fn reminders_per_offset_and_participant() {
        let now = Utc.with_ymd_and_hms(2026, 11, 1, 12, 0, 0).unwrap();
        let e = event(now, vec![Uuid::new_v4(), Uuid::new_v4()]);
        let entries = reminder_entries(&e, now, chrono_tz::Europe::Berlin);

        // two distinct offsets plus one deadline reminder, for two players
        assert_eq!(entries.len(), 6);
        assert!(entries.iter().all(|n| n.event_id == Some(e.id)));
        assert_eq!(
            entries.iter().filter(|n| matches!(n.kind, NotificationKind::DeadlineReminder { hours: 12 })).count(),
            2
        );
        let day_before = entries
            .iter()
            .find(|n| n.kind == NotificationKind::Reminder { hours: 24 })
            .unwrap();
        assert_eq!(day_before.scheduled_for, e.start_time - Duration::hours(24));
    }

    #[test]
    fn past_offsets_are_skipped() {
        let e = event(Utc::now(), vec![Uuid::new_v4()]);
        let now = e.start_time - Duration::hours(5);
        let entries = reminder_entries(&e, now, chrono_tz::Europe::Berlin);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, NotificationKind::Reminder { hours: 2 });
    }

    #[test]
    fn disabled_settings_produce_nothing() {
        let now = Utc.with_ymd_and_hms(2026, 11, 1, 12, 0, 0).unwrap();
        let mut e = event(now, vec![Uuid::new_v4()]);
        e.notification_settings.enabled = false;
        assert!(reminder_entries(&e, now, chrono_tz::Europe::Berlin).is_empty());
    }

    #[test]
    fn declined_players_get_no_reminder() {
        let now = Utc.with_ymd_and_hms(2026, 11, 1, 12, 0, 0).unwrap();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut e = event(now, vec![a, b]);
        let entries = reminder_entries(&e, now, chrono_tz::Europe::Berlin);
        e.declined.push(a);

        let send_time = e.start_time - Duration::hours(24);
        let for_a = entries.iter().find(|n| n.recipient_id == a && n.kind == NotificationKind::Reminder { hours: 24 }).unwrap();
        let for_b = entries.iter().find(|n| n.recipient_id == b && n.kind == NotificationKind::Reminder { hours: 24 }).unwrap();

        assert_eq!(skip_reason(for_a, Some(&e), send_time), Some("Empfänger hat abgesagt"));
        assert_eq!(skip_reason(for_b, Some(&e), send_time), None);
        assert_eq!(skip_reason(for_b, None, send_time), Some("Termin existiert nicht mehr"));
    }

    #[test]
    fn deadline_reminder_skipped_once_answered() {
        let now = Utc.with_ymd_and_hms(2026, 11, 1, 12, 0, 0).unwrap();
        let a = Uuid::new_v4();
        let mut e = event(now, vec![a]);
        let entries = reminder_entries(&e, now, chrono_tz::Europe::Berlin);
        let deadline_reminder = entries
            .iter()
            .find(|n| matches!(n.kind, NotificationKind::DeadlineReminder { .. }))
            .unwrap();

        let send_time = deadline_reminder.scheduled_for;
        assert_eq!(skip_reason(deadline_reminder, Some(&e), send_time), None);

        e.unsure.push(a);
        assert!(skip_reason(deadline_reminder, Some(&e), send_time).is_some());
    }

    #[test]
    fn log_kinds_match_reminders() {
        assert_eq!(
            reminder_log_kind(NotificationKind::Reminder { hours: 24 }),
            Some(ReminderKind::BeforeStart { hours: 24 })
        );
        assert_eq!(reminder_log_kind(NotificationKind::AutoInvite), None);
    }
}
