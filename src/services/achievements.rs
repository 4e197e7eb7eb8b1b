/*
Badge rules. Unlocking is idempotent at the storage layer, so these only
report what a player has earned, not what is new.
*/

use crate::{
    models::{achievement::Badge, attribute::PlayerAttribute},
    services::{attendance::AttendanceStats, overall_rating::OverallRating, rating_engine::MAX_LEVEL},
};

pub const ELITE_THRESHOLD: i32 = 90;
pub const RELIABLE_PERCENTAGE: f64 = 90.0;
pub const RELIABLE_MIN_EVENTS: u32 = 10;

pub fn rating_badges(attributes: &[PlayerAttribute], overall: Option<&OverallRating>) -> Vec<Badge> {
    let mut badges = Vec::new();

    if attributes.iter().any(PlayerAttribute::is_rated) {
        badges.push(Badge::ErsteBewertung);
    }
    if attributes.iter().any(|a| a.level >= 1) {
        badges.push(Badge::Aufsteiger);
    }
    if attributes.iter().any(|a| a.level >= MAX_LEVEL) {
        badges.push(Badge::Bundesliga);
    }
    if overall.is_some_and(|o| o.value >= ELITE_THRESHOLD) {
        badges.push(Badge::Elite);
    }

    badges
}

pub fn attendance_badges(stats: &AttendanceStats) -> Vec<Badge> {
    if stats.invited >= RELIABLE_MIN_EVENTS && stats.percentage() >= RELIABLE_PERCENTAGE {
        vec![Badge::Zuverlaessig]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::{
        models::{
            attribute::{AttributeUpdate, LeagueLevel},
            player::Position,
        },
        services::{overall_rating::RatingCategory, rating_engine::apply_update},
    };

    fn rate(value: f64, level: i32) -> PlayerAttribute {
        let mut attr = PlayerAttribute::new(Uuid::new_v4(), None, "Block", Utc::now());
        attr.level = level;
        apply_update(&mut attr, &AttributeUpdate { value: Some(value), ..Default::default() }, Utc::now())
            .unwrap();
        attr
    }

    #[test]
    fn nothing_before_first_rating() {
        let attr = PlayerAttribute::new(Uuid::new_v4(), None, "Block", Utc::now());
        assert!(rating_badges(&[attr], None).is_empty());
    }

    #[test]
    fn promotion_and_bundesliga_badges() {
        assert_eq!(rating_badges(&[rate(50.0, 0)], None), vec![Badge::ErsteBewertung]);
        assert_eq!(
            rating_badges(&[rate(95.0, 0)], None),
            vec![Badge::ErsteBewertung, Badge::Aufsteiger]
        );
        assert_eq!(
            rating_badges(&[rate(95.0, 6)], None),
            vec![Badge::ErsteBewertung, Badge::Aufsteiger, Badge::Bundesliga]
        );
    }

    #[test]
    fn elite_badge_from_overall() {
        let overall = OverallRating {
            value: 91,
            category: RatingCategory::Elite,
            position: Position::Universal,
            average_level: 0.0,
            league: LeagueLevel::Kreisliga,
            attributes_considered: 6,
        };
        assert!(rating_badges(&[rate(50.0, 0)], Some(&overall)).contains(&Badge::Elite));
    }

    #[test]
    fn reliable_needs_enough_events() {
        assert!(attendance_badges(&AttendanceStats { invited: 5, attended: 5 }).is_empty());
        assert_eq!(
            attendance_badges(&AttendanceStats { invited: 10, attended: 9 }),
            vec![Badge::Zuverlaessig]
        );
        assert!(attendance_badges(&AttendanceStats { invited: 20, attended: 17 }).is_empty());
    }
}
