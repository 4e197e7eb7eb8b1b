use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Badge {
    ErsteBewertung,
    Aufsteiger,
    Bundesliga,
    Elite,
    Zuverlaessig,
}

impl Badge {
    pub fn description(self) -> &'static str {
        match self {
            Badge::ErsteBewertung => "Erste Bewertung erhalten",
            Badge::Aufsteiger => "Erster Aufstieg in eine höhere Liga",
            Badge::Bundesliga => "Eine Fähigkeit auf Bundesliga-Niveau",
            Badge::Elite => "Gesamtbewertung im Elite-Bereich",
            Badge::Zuverlaessig => "Mindestens 90 % Trainingsbeteiligung",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub player_id: Uuid,
    pub badge_id: Badge,
    pub description: String,
    pub unlocked_at: DateTime<Utc>,
}

impl Achievement {
    pub fn new(player_id: Uuid, badge: Badge, now: DateTime<Utc>) -> Self {
        Achievement {
            player_id,
            badge_id: badge,
            description: badge.description().to_string(),
            unlocked_at: now,
        }
    }
}
