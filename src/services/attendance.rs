/*
RSVP handling, deadline auto-decline and attendance statistics.
*/

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::event::{Event, GuestPlayer, ResponseStatus},
};

pub fn respond(
    event: &mut Event,
    player_id: Uuid,
    status: ResponseStatus,
    now: DateTime<Utc>,
) -> Result<(), ApiError> {
    if !event.is_participant(player_id) {
        return Err(ApiError::Forbidden(
            "Du bist zu diesem Termin nicht eingeladen".to_string(),
        ));
    }

    // players backfilled from a pool may be invited after the deadline
    let invited_late = event
        .auto_invite
        .as_ref()
        .is_some_and(|s| s.invited_from_pool.contains(&player_id));

    if event.deadline_passed(now) && !invited_late {
        return Err(ApiError::BadRequest(
            "Die Abstimmungsfrist ist abgelaufen".to_string(),
        ));
    }
    if event.has_ended(now) {
        return Err(ApiError::BadRequest("Der Termin ist bereits vorbei".to_string()));
    }

    event.attending.retain(|p| *p != player_id);
    event.declined.retain(|p| *p != player_id);
    event.unsure.retain(|p| *p != player_id);

    match status {
        ResponseStatus::Accepted => event.attending.push(player_id),
        ResponseStatus::Declined => event.declined.push(player_id),
        ResponseStatus::Unsure => event.unsure.push(player_id),
    }

    Ok(())
}

pub fn add_guest(
    event: &mut Event,
    player_id: Uuid,
    from_team_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<(), ApiError> {
    if event.is_participant(player_id) {
        return Err(ApiError::BadRequest(
            "Der Spieler ist bereits eingeladen".to_string(),
        ));
    }
    event.guest_players.push(GuestPlayer {
        player_id,
        from_team_id,
        added_at: now,
    });
    Ok(())
}

/// Declines every participant without an answer once the voting deadline
/// has passed. Runs once per event; returns the players it declined.
pub fn auto_decline(event: &mut Event, now: DateTime<Utc>) -> Vec<Uuid> {
    if !event.auto_decline_after_deadline || event.deadline_processed || !event.deadline_passed(now) {
        return Vec::new();
    }

    let pending = event.pending_players();
    event.declined.extend(pending.iter().copied());
    event.deadline_processed = true;
    pending
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub invited: u32,
    pub attended: u32,
}

impl AttendanceStats {
    pub fn percentage(&self) -> f64 {
        if self.invited == 0 {
            return 0.0;
        }
        f64::from(self.attended) / f64::from(self.invited) * 100.0
    }
}

/// Attendance per player over events that have already ended.
pub fn attendance_by_player(events: &[Event], now: DateTime<Utc>) -> HashMap<Uuid, AttendanceStats> {
    let mut stats: HashMap<Uuid, AttendanceStats> = HashMap::new();

    for event in events.iter().filter(|e| e.has_ended(now)) {
        for player in event.participants() {
            let entry = stats.entry(player).or_default();
            entry.invited += 1;
            if event.attending.contains(&player) {
                entry.attended += 1;
            }
        }
    }

    stats
}
