use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::event::{
    AutoInviteRequest, CreateEventRequest, EventType, NotificationSettings, RecurrencePattern,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingTemplate {
    pub id: Uuid,
    pub team_id: Uuid,
    pub title: String,
    pub event_type: EventType,
    pub description: Option<String>,
    pub location: Option<String>,
    pub duration_minutes: i32,
    pub notification_settings: NotificationSettings,
    pub auto_invite: Option<AutoInviteRequest>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    pub team_id: Uuid,
    pub title: String,
    pub event_type: EventType,
    pub description: Option<String>,
    pub location: Option<String>,
    pub duration_minutes: i32,
    pub notification_settings: Option<NotificationSettings>,
    pub auto_invite: Option<AutoInviteRequest>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantiateTemplateRequest {
    pub start_time: DateTime<Utc>,
    pub created_by: Uuid,
    /// Hours before start at which voting closes.
    pub voting_deadline_hours: Option<u32>,
    #[serde(default)]
    pub auto_decline_after_deadline: bool,
    pub recurrence: Option<RecurrencePattern>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateQuery {
    pub team_id: Uuid,
}

impl TrainingTemplate {
    /// Builds the creation request for one event based on this template.
    pub fn event_request(&self, request: InstantiateTemplateRequest) -> CreateEventRequest {
        let start_time = request.start_time;
        CreateEventRequest {
            title: self.title.clone(),
            event_type: self.event_type,
            description: self.description.clone(),
            location: self.location.clone(),
            start_time,
            end_time: start_time + Duration::minutes(i64::from(self.duration_minutes)),
            team_ids: vec![self.team_id],
            invited: Vec::new(),
            created_by: request.created_by,
            voting_deadline: request
                .voting_deadline_hours
                .map(|hours| start_time - Duration::hours(i64::from(hours))),
            auto_decline_after_deadline: request.auto_decline_after_deadline,
            notification_settings: Some(self.notification_settings.clone()),
            auto_invite: self.auto_invite.clone(),
            recurrence: request.recurrence,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn event_request_takes_duration_and_deadline_from_template() {
        let team_id = Uuid::new_v4();
        let template = TrainingTemplate {
            id: Uuid::new_v4(),
            team_id,
            title: "Dienstagstraining".to_string(),
            event_type: EventType::Training,
            description: None,
            location: Some("Halle Nord".to_string()),
            duration_minutes: 120,
            notification_settings: NotificationSettings::default(),
            auto_invite: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        let start = Utc.with_ymd_and_hms(2026, 11, 3, 18, 0, 0).unwrap();

        let request = template.event_request(InstantiateTemplateRequest {
            start_time: start,
            created_by: Uuid::new_v4(),
            voting_deadline_hours: Some(48),
            auto_decline_after_deadline: true,
            recurrence: None,
        });

        assert_eq!(request.end_time, Utc.with_ymd_and_hms(2026, 11, 3, 20, 0, 0).unwrap());
        assert_eq!(request.voting_deadline, Some(Utc.with_ymd_and_hms(2026, 11, 1, 18, 0, 0).unwrap()));
        assert_eq!(request.team_ids, vec![team_id]);
        assert!(request.invited.is_empty());
        assert_eq!(request.location.as_deref(), Some("Halle Nord"));
    }
}
