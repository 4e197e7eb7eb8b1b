/*
Position-aware overall rating over the six core attributes.
*/

use std::collections::HashMap;

use serde::Serialize;
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::models::{
    attribute::{CoreAttribute, LeagueLevel, PlayerAttribute},
    player::Position,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum RatingCategory {
    Elite,
    #[serde(rename = "Sehr gut")]
    #[strum(serialize = "Sehr gut")]
    SehrGut,
    Gut,
    Durchschnitt,
    Entwicklungsbedarf,
}

impl RatingCategory {
    pub fn for_rating(rating: i32) -> Self {
        match rating {
            r if r >= 90 => RatingCategory::Elite,
            r if r >= 75 => RatingCategory::SehrGut,
            r if r >= 60 => RatingCategory::Gut,
            r if r >= 40 => RatingCategory::Durchschnitt,
            _ => RatingCategory::Entwicklungsbedarf,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallRating {
    pub value: i32,
    pub category: RatingCategory,
    pub position: Position,
    pub average_level: f64,
    pub league: LeagueLevel,
    pub attributes_considered: usize,
}

/// Weight of a core attribute for a position. Each row sums to 1.
pub fn weight(position: Position, attribute: CoreAttribute) -> f64 {
    use CoreAttribute::*;

    match position {
        Position::Zuspieler => match attribute {
            Aufschlag => 0.10,
            Annahme => 0.10,
            Zuspiel => 0.40,
            Angriff => 0.10,
            Block => 0.10,
            Abwehr => 0.20,
        },
        Position::Aussenangreifer => match attribute {
            Aufschlag => 0.15,
            Annahme => 0.25,
            Zuspiel => 0.05,
            Angriff => 0.30,
            Block => 0.10,
            Abwehr => 0.15,
        },
        Position::Mittelblocker => match attribute {
            Aufschlag => 0.15,
            Annahme => 0.05,
            Zuspiel => 0.05,
            Angriff => 0.30,
            Block => 0.40,
            Abwehr => 0.05,
        },
        Position::Diagonalangreifer => match attribute {
            Aufschlag => 0.15,
            Annahme => 0.05,
            Zuspiel => 0.05,
            Angriff => 0.40,
            Block => 0.25,
            Abwehr => 0.10,
        },
        Position::Libero => match attribute {
            Aufschlag => 0.05,
            Annahme => 0.40,
            Zuspiel => 0.15,
            Angriff => 0.0,
            Block => 0.0,
            Abwehr => 0.40,
        },
        Position::Universal => 1.0 / 6.0,
    }
}

/// Picks the rating that applies per attribute: a rating for `team_id`
/// shadows the universal one, ratings of other teams are ignored.
pub fn effective_attributes(attributes: &[PlayerAttribute], team_id: Option<Uuid>) -> Vec<&PlayerAttribute> {
    let mut chosen: HashMap<&str, &PlayerAttribute> = HashMap::new();

    for attribute in attributes.iter().filter(|a| a.is_rated()) {
        let applies = attribute.team_id.is_none() || attribute.team_id == team_id;
        if !applies {
            continue;
        }
        let name = attribute.attribute_name.as_str();
        match chosen.get(name) {
            Some(existing) if existing.team_id.is_some() => {}
            _ => {
                chosen.insert(name, attribute);
            }
        }
    }

    let mut result: Vec<&PlayerAttribute> = chosen.into_values().collect();
    result.sort_by(|a, b| a.attribute_name.cmp(&b.attribute_name));
    result
}

/// Weighted sum over the core attributes that are present, renormalised
/// over their weights. `None` when no weighted core attribute is rated.
pub fn compute_overall(attributes: &[&PlayerAttribute], position: Position) -> Option<OverallRating> {
    let mut weighted_value = 0.0;
    let mut weighted_level = 0.0;
    let mut total_weight = 0.0;
    let mut considered = 0;

    for core in CoreAttribute::iter() {
        let w = weight(position, core);
        if w <= 0.0 {
            continue;
        }
        let name = core.to_string();
        let Some(attribute) = attributes.iter().find(|a| a.attribute_name == name) else {
            continue;
        };
        weighted_value += w * f64::from(attribute.numeric_value);
        weighted_level += w * f64::from(attribute.level);
        total_weight += w;
        considered += 1;
    }

    if considered == 0 || total_weight <= 0.0 {
        return None;
    }

    let value = (weighted_value / total_weight).round() as i32;
    let average_level = ((weighted_level / total_weight) * 100.0).round() / 100.0;

    Some(OverallRating {
        value,
        category: RatingCategory::for_rating(value),
        position,
        average_level,
        league: LeagueLevel::from_level(average_level.round() as i32),
        attributes_considered: considered,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::attribute::ProgressionEntry;

    fn rated(name: &str, value: i32, level: i32, team_id: Option<Uuid>) -> PlayerAttribute {
        let now = Utc::now();
        let mut attr = PlayerAttribute::new(Uuid::new_v4(), team_id, name, now);
        attr.numeric_value = value;
        attr.level_rating = value;
        attr.level = level;
        attr.progression_history.push(ProgressionEntry { value, change: 0, notes: None, timestamp: now });
        attr
    }

    #[test]
    fn every_position_weights_sum_to_one() {
        for position in Position::iter() {
            let sum: f64 = CoreAttribute::iter().map(|c| weight(position, c)).sum();
            assert!((sum - 1.0).abs() < 1e-9, "{position} sums to {sum}");
        }
    }

    #[test]
    fn categories_follow_thresholds() {
        assert_eq!(RatingCategory::for_rating(95), RatingCategory::Elite);
        assert_eq!(RatingCategory::for_rating(90), RatingCategory::Elite);
        assert_eq!(RatingCategory::for_rating(89), RatingCategory::SehrGut);
        assert_eq!(RatingCategory::for_rating(75), RatingCategory::SehrGut);
        assert_eq!(RatingCategory::for_rating(60), RatingCategory::Gut);
        assert_eq!(RatingCategory::for_rating(40), RatingCategory::Durchschnitt);
        assert_eq!(RatingCategory::for_rating(39), RatingCategory::Entwicklungsbedarf);
        assert_eq!(RatingCategory::SehrGut.to_string(), "Sehr gut");
    }

    #[test]
    fn overall_is_rounded_weighted_sum() {
        let attrs = vec![
            rated("Aufschlag", 50, 0, None),
            rated("Annahme", 60, 0, None),
            rated("Zuspiel", 90, 0, None),
            rated("Angriff", 40, 0, None),
            rated("Block", 30, 0, None),
            rated("Abwehr", 70, 0, None),
        ];
        let refs: Vec<&PlayerAttribute> = attrs.iter().collect();

        let overall = compute_overall(&refs, Position::Zuspieler).unwrap();
        // 5 + 6 + 36 + 4 + 3 + 14
        assert_eq!(overall.value, 68);
        assert_eq!(overall.category, RatingCategory::Gut);
        assert_eq!(overall.attributes_considered, 6);
    }

    #[test]
    fn missing_attributes_are_renormalised() {
        let attrs = vec![rated("Zuspiel", 80, 0, None), rated("Abwehr", 50, 0, None)];
        let refs: Vec<&PlayerAttribute> = attrs.iter().collect();

        // (0.4 * 80 + 0.2 * 50) / 0.6 = 70
        let overall = compute_overall(&refs, Position::Zuspieler).unwrap();
        assert_eq!(overall.value, 70);
        assert_eq!(overall.attributes_considered, 2);
    }

    #[test]
    fn libero_ignores_attack_and_block() {
        let attrs = vec![rated("Angriff", 99, 0, None), rated("Block", 99, 0, None)];
        let refs: Vec<&PlayerAttribute> = attrs.iter().collect();
        assert!(compute_overall(&refs, Position::Libero).is_none());
    }

    #[test]
    fn non_core_attributes_do_not_count() {
        let attrs = vec![rated("Athletik", 99, 0, None), rated("Block", 40, 0, None)];
        let refs: Vec<&PlayerAttribute> = attrs.iter().collect();
        let overall = compute_overall(&refs, Position::Universal).unwrap();
        assert_eq!(overall.value, 40);
    }

    #[test]
    fn average_level_maps_to_league() {
        let attrs = vec![rated("Angriff", 50, 3, None), rated("Block", 50, 3, None)];
        let refs: Vec<&PlayerAttribute> = attrs.iter().collect();
        let overall = compute_overall(&refs, Position::Mittelblocker).unwrap();
        assert_eq!(overall.average_level, 3.0);
        assert_eq!(overall.league, LeagueLevel::Verbandsliga);
    }

    #[test]
    fn team_rating_shadows_universal_rating() {
        let team = Uuid::new_v4();
        let other_team = Uuid::new_v4();
        let attrs = vec![
            rated("Angriff", 40, 0, None),
            rated("Angriff", 70, 0, Some(team)),
            rated("Angriff", 99, 0, Some(other_team)),
            rated("Block", 55, 0, None),
        ];

        let for_team = effective_attributes(&attrs, Some(team));
        assert_eq!(for_team.len(), 2);
        let angriff = for_team.iter().find(|a| a.attribute_name == "Angriff").unwrap();
        assert_eq!(angriff.numeric_value, 70);

        let universal = effective_attributes(&attrs, None);
        let angriff = universal.iter().find(|a| a.attribute_name == "Angriff").unwrap();
        assert_eq!(angriff.numeric_value, 40);
    }

    #[test]
    fn unrated_attributes_are_ignored() {
        let attrs = vec![PlayerAttribute::new(Uuid::new_v4(), None, "Block", Utc::now())];
        assert!(effective_attributes(&attrs, None).is_empty());
    }
}
