/*
Training-pool auto-invite: backfills under-subscribed events from a pool.
*/

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::{
    event::{AutoInviteTrigger, Event},
    training_pool::TrainingPool,
};

#[derive(Debug, Clone, PartialEq)]
pub struct PoolCandidate {
    pub player_id: Uuid,
    pub overall: Option<i32>,
    pub attendance_percentage: f64,
}

/// True once the configured trigger moment is reached for an event that has
/// not started and whose auto-invite has not been evaluated yet.
pub fn trigger_reached(event: &Event, now: DateTime<Utc>) -> bool {
    let Some(settings) = event.auto_invite.as_ref() else {
        return false;
    };
    if !settings.enabled || settings.triggered_at.is_some() || now >= event.start_time {
        return false;
    }

    match settings.trigger {
        AutoInviteTrigger::AtDeadline => event.deadline_passed(now),
        AutoInviteTrigger::HoursBefore { hours } => {
            now >= event.start_time - Duration::hours(i64::from(hours))
        }
    }
}

pub fn open_slots(event: &Event) -> usize {
    event
        .auto_invite
        .as_ref()
        .map(|s| (s.min_participants as usize).saturating_sub(event.attending.len()))
        .unwrap_or(0)
}

/// Approved pool players that are not on the event yet.
pub fn eligible_players(pool: &TrainingPool, event: &Event) -> Vec<Uuid> {
    pool.approved
        .iter()
        .copied()
        .filter(|p| !event.is_participant(*p))
        .collect()
}

/// Best candidates first: overall rating (unrated last), then attendance.
pub fn rank_candidates(mut candidates: Vec<PoolCandidate>) -> Vec<PoolCandidate> {
    candidates.sort_by(|a, b| {
        let by_rating = match (a.overall, b.overall) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_rating
            .then_with(|| {
                b.attendance_percentage
                    .partial_cmp(&a.attendance_percentage)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    candidates
}

pub fn select_candidates(candidates: Vec<PoolCandidate>, slots: usize) -> Vec<PoolCandidate> {
    rank_candidates(candidates).into_iter().take(slots).collect()
}

/// Marks the trigger as evaluated and puts the chosen players on the event.
pub fn record_invites(event: &mut Event, players: &[Uuid], now: DateTime<Utc>) {
    for player in players {
        if !event.invited.contains(player) {
            event.invited.push(*player);
        }
    }
    if let Some(settings) = event.auto_invite.as_mut() {
        settings.triggered_at = Some(now);
        settings.invited_from_pool.extend(players.iter().copied());
    }
}
