use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use chrono_tz::Tz;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{
        event::{
            AddGuestRequest, AutoInviteTrigger, CreateEventRequest, DeleteScope, Event, EventQuery,
            RsvpRequest,
        },
        template::{CreateTemplateRequest, InstantiateTemplateRequest, TrainingTemplate},
        training_pool::{CreatePoolRequest, PoolScope, TrainingPool},
    },
    services::{
        attendance,
        database::Database,
        notification_queue,
        overall_rating::{compute_overall, effective_attributes},
        rating_engine::MAX_LEVEL,
        recurrence,
        training_pool::{self, PlayerQualification},
    },
};

pub struct EventController {
    db: Arc<Database>,
    timezone: Tz,
}

impl EventController {
    pub fn new(db: Arc<Database>, timezone: Tz) -> Self {
        EventController { db, timezone }
    }

    // MARK: Events
    pub async fn create_event(&self, request: CreateEventRequest) -> Result<Vec<Event>, ApiError> {
        validate_event_request(&request)?;

        if let Some(auto_invite) = &request.auto_invite {
            self.require_pool(auto_invite.pool_id).await?;
        }
        self.require_teams(&request.team_ids).await?;

        let invited = if request.invited.is_empty() {
            self.db.read_team_player_ids(&request.team_ids).await?
        } else {
            dedup(request.invited.clone())
        };
        ensure_invitations(&invited)?;

        let now = Utc::now();
        let base = Event {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            event_type: request.event_type,
            description: request.description,
            location: request.location,
            start_time: request.start_time,
            end_time: request.end_time,
            team_ids: request.team_ids,
            invited,
            attending: Vec::new(),
            declined: Vec::new(),
            unsure: Vec::new(),
            guest_players: Vec::new(),
            recurring_group_id: None,
            voting_deadline: request.voting_deadline,
            auto_decline_after_deadline: request.auto_decline_after_deadline,
            deadline_processed: false,
            notification_settings: request.notification_settings.unwrap_or_default(),
            reminders_sent: Vec::new(),
            auto_invite: request.auto_invite.map(|a| a.into_settings()),
            created_by: request.created_by,
            created_at: now,
        };

        let events = match &request.recurrence {
            Some(pattern) => recurrence::materialize(base, pattern, self.timezone)?,
            None => vec![base],
        };

        self.db.insert_events(&events).await?;

        let reminders: Vec<_> = events
            .iter()
            .flat_map(|e| notification_queue::reminder_entries(e, now, self.timezone))
            .collect();
        self.db.insert_notifications(&reminders).await?;

        info!(
            "[EVENT_CONTROLLER]: created {} event(s), queued {} reminder(s)",
            events.len(),
            reminders.len()
        );
        Ok(events)
    }

    pub async fn require_teams(&self, team_ids: &[Uuid]) -> Result<(), ApiError> {
        if team_ids.is_empty() {
            return Ok(());
        }
        let existing = self.db.read_existing_team_ids(team_ids).await?;
        match first_unknown(team_ids, &existing) {
            Some(team_id) => Err(ApiError::NotFound(format!("Team {} nicht gefunden", team_id))),
            None => Ok(()),
        }
    }

    pub async fn list_events(&self, query: EventQuery) -> Result<Vec<Event>, ApiError> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if to < from {
                return Err(ApiError::BadRequest("Das Ende des Zeitraums liegt vor dem Anfang".to_string()));
            }
        }
        self.db.read_events(&query).await
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Event, ApiError> {
        self.db
            .read_event(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Termin nicht gefunden".to_string()))
    }

    /// Deletes one event, or with `Series` the event and every later
    /// instance of its recurring group.
    pub async fn delete_event(&self, id: Uuid, scope: DeleteScope) -> Result<u64, ApiError> {
        let event = self.get_event(id).await?;

        let ids = match (scope, event.recurring_group_id) {
            (DeleteScope::Series, Some(group_id)) => self.db.read_series_ids(group_id, event.start_time).await?,
            _ => vec![event.id],
        };

        let deleted = self.db.delete_events(&ids).await?;
        info!(%id, ?scope, deleted, "[EVENT_CONTROLLER]: events deleted");
        Ok(deleted)
    }

    pub async fn respond(&self, id: Uuid, request: RsvpRequest) -> Result<Event, ApiError> {
        let now = Utc::now();
        let (event, _) = self
            .db
            .update_event_locked(id, |event| attendance::respond(event, request.player_id, request.status, now))
            .await?;

        if request.apply_to_series {
            if let Some(group_id) = event.recurring_group_id {
                let later = self.db.read_series_ids(group_id, event.start_time).await?;
                for other in later.into_iter().filter(|other| *other != id) {
                    let result = self
                        .db
                        .update_event_locked(other, |e| attendance::respond(e, request.player_id, request.status, now))
                        .await;
                    if let Err(e) = result {
                        warn!(event_id = %other, "[EVENT_CONTROLLER]: series response skipped: {}", e);
                    }
                }
            }
        }

        Ok(event)
    }

    pub async fn add_guest(&self, id: Uuid, request: AddGuestRequest) -> Result<Event, ApiError> {
        if self.db.read_player(request.player_id).await?.is_none() {
            return Err(ApiError::NotFound("Spieler nicht gefunden".to_string()));
        }

        let now = Utc::now();
        let (event, _) = self
            .db
            .update_event_locked(id, |event| {
                if event.has_ended(now) {
                    return Err(ApiError::BadRequest("Der Termin ist bereits vorbei".to_string()));
                }
                attendance::add_guest(event, request.player_id, request.from_team_id, now)
            })
            .await?;

        Ok(event)
    }
    // MARK: Events End





    // MARK: Training pools
    pub async fn create_pool(&self, request: CreatePoolRequest) -> Result<TrainingPool, ApiError> {
        if request.name.trim().is_empty() {
            return Err(ApiError::BadRequest("Der Pool braucht einen Namen".to_string()));
        }
        if let PoolScope::League { min_level } = request.scope {
            if !(0..=MAX_LEVEL).contains(&min_level) {
                return Err(ApiError::BadRequest(format!("Ungültige Liga-Stufe: {}", min_level)));
            }
        }
        if let PoolScope::Team { team_id } = request.scope {
            self.require_teams(&[team_id]).await?;
        }

        let pool = TrainingPool {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            scope: request.scope,
            pending: Vec::new(),
            approved: Vec::new(),
            created_at: Utc::now(),
        };
        self.db.insert_pool(&pool).await?;
        Ok(pool)
    }

    pub async fn require_pool(&self, id: Uuid) -> Result<TrainingPool, ApiError> {
        self.db
            .read_pool(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Trainingspool nicht gefunden".to_string()))
    }

    pub async fn join_pool(&self, id: Uuid, player_id: Uuid) -> Result<TrainingPool, ApiError> {
        let player = self
            .db
            .read_player(player_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Spieler nicht gefunden".to_string()))?;

        let attributes = self.db.read_attributes(player_id).await?;
        let qualification = PlayerQualification {
            average_level: compute_overall(&effective_attributes(&attributes, None), player.position)
                .map(|overall| overall.average_level),
            team_ids: self.db.read_player_team_ids(player_id).await?,
        };

        self.db
            .update_pool_locked(id, |pool| training_pool::request_join(pool, player_id, &qualification))
            .await
    }

    pub async fn approve_pool_player(&self, id: Uuid, player_id: Uuid) -> Result<TrainingPool, ApiError> {
        self.db
            .update_pool_locked(id, |pool| training_pool::approve(pool, player_id))
            .await
    }

    pub async fn remove_pool_player(&self, id: Uuid, player_id: Uuid) -> Result<TrainingPool, ApiError> {
        self.db
            .update_pool_locked(id, |pool| training_pool::remove(pool, player_id))
            .await
    }
    // MARK: Training pools End





    // MARK: Templates
    pub async fn create_template(&self, request: CreateTemplateRequest) -> Result<TrainingTemplate, ApiError> {
        if request.title.trim().is_empty() {
            return Err(ApiError::BadRequest("Die Vorlage braucht einen Titel".to_string()));
        }
        if request.duration_minutes <= 0 {
            return Err(ApiError::BadRequest("Die Dauer muss positiv sein".to_string()));
        }
        if let Some(auto_invite) = &request.auto_invite {
            self.require_pool(auto_invite.pool_id).await?;
        }
        self.require_teams(&[request.team_id]).await?;

        let template = TrainingTemplate {
            id: Uuid::new_v4(),
            team_id: request.team_id,
            title: request.title.trim().to_string(),
            event_type: request.event_type,
            description: request.description,
            location: request.location,
            duration_minutes: request.duration_minutes,
            notification_settings: request.notification_settings.unwrap_or_default(),
            auto_invite: request.auto_invite,
            created_by: request.created_by,
            created_at: Utc::now(),
        };
        self.db.insert_template(&template).await?;
        Ok(template)
    }

    pub async fn list_templates(&self, team_id: Uuid) -> Result<Vec<TrainingTemplate>, ApiError> {
        self.db.read_templates(team_id).await
    }

    pub async fn instantiate_template(
        &self,
        id: Uuid,
        request: InstantiateTemplateRequest,
    ) -> Result<Vec<Event>, ApiError> {
        let template = self
            .db
            .read_template(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Vorlage nicht gefunden".to_string()))?;

        self.create_event(template.event_request(request)).await
    }
    // MARK: Templates End
}

fn dedup(mut players: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    players.retain(|p| seen.insert(*p));
    players
}

fn first_unknown(requested: &[Uuid], existing: &[Uuid]) -> Option<Uuid> {
    requested.iter().copied().find(|id| !existing.contains(id))
}

// a roster fallback over teams without players leaves nobody to invite
fn ensure_invitations(invited: &[Uuid]) -> Result<(), ApiError> {
    if invited.is_empty() {
        return Err(ApiError::BadRequest(
            "Die ausgewählten Teams haben keine Spieler zum Einladen".to_string(),
        ));
    }
    Ok(())
}

fn validate_event_request(request: &CreateEventRequest) -> Result<(), ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Der Termin braucht einen Titel".to_string()));
    }
    if request.end_time <= request.start_time {
        return Err(ApiError::BadRequest("Das Ende muss nach dem Beginn liegen".to_string()));
    }
    if request.voting_deadline.is_some_and(|deadline| deadline > request.start_time) {
        return Err(ApiError::BadRequest(
            "Die Abstimmungsfrist muss vor dem Beginn liegen".to_string(),
        ));
    }
    if request.auto_decline_after_deadline && request.voting_deadline.is_none() {
        return Err(ApiError::BadRequest(
            "Automatisches Absagen braucht eine Abstimmungsfrist".to_string(),
        ));
    }
    if request.invited.is_empty() && request.team_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "Es muss mindestens ein Team oder ein Spieler eingeladen werden".to_string(),
        ));
    }
    if let Some(auto_invite) = &request.auto_invite {
        if auto_invite.min_participants == 0 {
            return Err(ApiError::BadRequest(
                "Die Mindestanzahl für Nachnominierungen muss größer als 0 sein".to_string(),
            ));
        }
        if matches!(auto_invite.trigger, AutoInviteTrigger::AtDeadline)
            && request.voting_deadline.is_none()
        {
            return Err(ApiError::BadRequest(
                "Nachnominierung zur Frist braucht eine Abstimmungsfrist".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone};

    use super::*;
    use crate::models::event::{AutoInviteRequest, EventType};

    fn request(start: DateTime<Utc>) -> CreateEventRequest {
        CreateEventRequest {
            title: "Training".to_string(),
            event_type: EventType::Training,
            description: None,
            location: Some("Halle 2".to_string()),
            start_time: start,
            end_time: start + Duration::hours(2),
            team_ids: vec![Uuid::new_v4()],
            invited: Vec::new(),
            created_by: Uuid::new_v4(),
            voting_deadline: Some(start - Duration::hours(24)),
            auto_decline_after_deadline: true,
            notification_settings: None,
            auto_invite: None,
            recurrence: None,
        }
    }

    #[test]
    fn valid_request_passes() {
        let start = Utc.with_ymd_and_hms(2026, 11, 10, 18, 0, 0).unwrap();
        assert!(validate_event_request(&request(start)).is_ok());
    }

    #[test]
    fn end_before_start_is_rejected() {
        let start = Utc.with_ymd_and_hms(2026, 11, 10, 18, 0, 0).unwrap();
        let mut r = request(start);
        r.end_time = start - Duration::minutes(1);
        assert!(matches!(validate_event_request(&r), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn deadline_after_start_is_rejected() {
        let start = Utc.with_ymd_and_hms(2026, 11, 10, 18, 0, 0).unwrap();
        let mut r = request(start);
        r.voting_deadline = Some(start + Duration::hours(1));
        assert!(validate_event_request(&r).is_err());
    }

    #[test]
    fn auto_decline_needs_deadline() {
        let start = Utc.with_ymd_and_hms(2026, 11, 10, 18, 0, 0).unwrap();
        let mut r = request(start);
        r.voting_deadline = None;
        assert!(validate_event_request(&r).is_err());

        r.auto_decline_after_deadline = false;
        assert!(validate_event_request(&r).is_ok());
    }

    #[test]
    fn auto_invite_needs_positive_minimum() {
        let start = Utc.with_ymd_and_hms(2026, 11, 10, 18, 0, 0).unwrap();
        let mut r = request(start);
        r.auto_invite = Some(AutoInviteRequest {
            pool_id: Uuid::new_v4(),
            min_participants: 0,
            trigger: AutoInviteTrigger::HoursBefore { hours: 6 },
        });
        assert!(validate_event_request(&r).is_err());
    }

    #[test]
    fn no_audience_is_rejected() {
        let start = Utc.with_ymd_and_hms(2026, 11, 10, 18, 0, 0).unwrap();
        let mut r = request(start);
        r.team_ids.clear();
        assert!(validate_event_request(&r).is_err());

        r.invited = vec![Uuid::new_v4()];
        assert!(validate_event_request(&r).is_ok());
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(dedup(vec![a, b, a]), vec![a, b]);
    }

    #[test]
    fn unknown_team_is_reported() {
        let (known, unknown) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(first_unknown(&[known, unknown], &[known]), Some(unknown));
        assert_eq!(first_unknown(&[known], &[known]), None);
        assert_eq!(first_unknown(&[], &[]), None);
    }

    #[test]
    fn empty_roster_is_a_bad_request() {
        let err = ensure_invitations(&[]).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert!(ensure_invitations(&[Uuid::new_v4()]).is_ok());
    }
}
