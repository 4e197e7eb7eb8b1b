/*
Player attribute ratings and the league ladder they climb.
*/

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, FromRepr, IntoEnumIterator};
use uuid::Uuid;

use crate::models::achievement::Badge;

/// One of the eight league tiers an attribute can be rated in.
///
/// Every tier spans its own 1-99 rating band; the discriminant is the
/// stored `level` of a [`PlayerAttribute`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumIter, EnumString, FromRepr,
)]
#[repr(u8)]
pub enum LeagueLevel {
    Kreisliga = 0,
    Bezirksliga = 1,
    Landesliga = 2,
    Verbandsliga = 3,
    Oberliga = 4,
    Regionalliga = 5,
    #[strum(serialize = "Dritte Liga")]
    #[serde(rename = "Dritte Liga")]
    DritteLiga = 6,
    Bundesliga = 7,
}

impl LeagueLevel {
    pub const MAX: LeagueLevel = LeagueLevel::Bundesliga;

    /// Out-of-range levels saturate to the nearest tier.
    pub fn from_level(level: i32) -> Self {
        let clamped = level.clamp(0, LeagueLevel::MAX as i32) as u8;
        LeagueLevel::from_repr(clamped).unwrap_or(LeagueLevel::Kreisliga)
    }

    pub fn level(self) -> i32 {
        self as i32
    }

    pub fn next(self) -> Option<Self> {
        LeagueLevel::from_repr(self as u8 + 1)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelInfo {
    pub level: i32,
    pub name: String,
    pub min_rating: i32,
    pub max_rating: i32,
}

pub fn level_table() -> Vec<LevelInfo> {
    LeagueLevel::iter()
        .map(|league| LevelInfo {
            level: league.level(),
            name: league.to_string(),
            min_rating: 1,
            max_rating: 99,
        })
        .collect()
}

/// The six attributes that feed the overall rating.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
pub enum CoreAttribute {
    Aufschlag,
    Annahme,
    Zuspiel,
    Angriff,
    Block,
    Abwehr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionEntry {
    pub value: i32,
    pub change: i32,
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAttribute {
    pub id: Uuid,
    pub player_id: Uuid,
    /// `None` marks the universal rating, valid for every team.
    pub team_id: Option<Uuid>,
    pub attribute_name: String,
    pub numeric_value: i32,
    pub sub_attributes: BTreeMap<String, i32>,
    pub level: i32,
    pub level_rating: i32,
    pub progression_history: Vec<ProgressionEntry>,
    pub updated_at: DateTime<Utc>,
}

impl PlayerAttribute {
    /// An unrated attribute; it only becomes a real rating once an update
    /// has been applied to it.
    pub fn new(player_id: Uuid, team_id: Option<Uuid>, attribute_name: &str, now: DateTime<Utc>) -> Self {
        PlayerAttribute {
            id: Uuid::new_v4(),
            player_id,
            team_id,
            attribute_name: attribute_name.to_string(),
            numeric_value: 1,
            sub_attributes: BTreeMap::new(),
            level: 0,
            level_rating: 1,
            progression_history: Vec::new(),
            updated_at: now,
        }
    }

    pub fn is_rated(&self) -> bool {
        !self.progression_history.is_empty()
    }

    pub fn league(&self) -> LeagueLevel {
        LeagueLevel::from_level(self.level)
    }

    pub fn is_universal(&self) -> bool {
        self.team_id.is_none()
    }
}

/// Body of a coach's rating update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeUpdate {
    pub team_id: Option<Uuid>,
    pub value: Option<f64>,
    pub sub_attributes: Option<BTreeMap<String, f64>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RatingOutcome {
    Created { value: i32 },
    #[serde(rename_all = "camelCase")]
    Updated { previous: i32, value: i32 },
    /// `rated` is the value the coach entered, `value` the one carried into
    /// the new league band.
    #[serde(rename_all = "camelCase")]
    Promoted { from: LeagueLevel, to: LeagueLevel, rated: i32, value: i32 },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeUpdateResponse {
    pub attribute: PlayerAttribute,
    pub outcome: RatingOutcome,
    pub unlocked_badges: Vec<Badge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn league_levels_are_ordered_from_kreisliga_to_bundesliga() {
        let names: Vec<String> = LeagueLevel::iter().map(|l| l.to_string()).collect();
        assert_eq!(names.len(), 8);
        assert_eq!(names.first().map(String::as_str), Some("Kreisliga"));
        assert_eq!(names[6], "Dritte Liga");
        assert_eq!(names.last().map(String::as_str), Some("Bundesliga"));
        assert!(LeagueLevel::Kreisliga < LeagueLevel::Bundesliga);
    }

    #[test]
    fn from_level_saturates() {
        assert_eq!(LeagueLevel::from_level(-3), LeagueLevel::Kreisliga);
        assert_eq!(LeagueLevel::from_level(4), LeagueLevel::Oberliga);
        assert_eq!(LeagueLevel::from_level(12), LeagueLevel::Bundesliga);
        assert_eq!(LeagueLevel::Bundesliga.next(), None);
        assert_eq!(LeagueLevel::Oberliga.next(), Some(LeagueLevel::Regionalliga));
    }

    #[test]
    fn core_attributes_parse_from_their_names() {
        assert_eq!("Zuspiel".parse::<CoreAttribute>().unwrap(), CoreAttribute::Zuspiel);
        assert!("Athletik".parse::<CoreAttribute>().is_err());
    }
}
