/*
Applies coach rating updates to a player attribute: clamping, sub-attribute
averaging, league promotion and the progression history.
*/

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{
    error::ApiError,
    models::attribute::{AttributeUpdate, LeagueLevel, PlayerAttribute, ProgressionEntry, RatingOutcome},
};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 99;
pub const PROMOTION_THRESHOLD: i32 = 90;
pub const MAX_LEVEL: i32 = LeagueLevel::MAX as i32;

/// Subtracted on promotion so that 90 lands on 1 of the next band.
const PROMOTION_OFFSET: i32 = PROMOTION_THRESHOLD - MIN_RATING;

pub fn clamp_rating(value: f64) -> Result<i32, ApiError> {
    if !value.is_finite() {
        return Err(ApiError::BadRequest(
            "Bewertung muss eine Zahl zwischen 1 und 99 sein".to_string(),
        ));
    }
    Ok((value.round() as i64).clamp(MIN_RATING as i64, MAX_RATING as i64) as i32)
}

pub fn average_rating(sub_attributes: &BTreeMap<String, i32>) -> Option<i32> {
    if sub_attributes.is_empty() {
        return None;
    }
    let sum: i32 = sub_attributes.values().sum();
    let mean = f64::from(sum) / sub_attributes.len() as f64;
    Some((mean.round() as i32).clamp(MIN_RATING, MAX_RATING))
}

pub fn apply_update(
    attribute: &mut PlayerAttribute,
    update: &AttributeUpdate,
    now: DateTime<Utc>,
) -> Result<RatingOutcome, ApiError> {
    let (target, sub_attributes) = resolve_target(attribute, update)?;

    let previous = attribute.is_rated().then_some(attribute.numeric_value);
    let level = attribute.level.clamp(0, MAX_LEVEL);
    let coach_notes = update
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    attribute.sub_attributes = sub_attributes;

    let (outcome, notes) = if target >= PROMOTION_THRESHOLD && level < MAX_LEVEL {
        let from = LeagueLevel::from_level(level);
        let to = from.next().unwrap_or(LeagueLevel::MAX);
        let carried = target - PROMOTION_OFFSET;

        attribute.level = to.level();
        attribute.numeric_value = carried;
        for value in attribute.sub_attributes.values_mut() {
            *value = carried;
        }

        let note = match coach_notes {
            Some(extra) => format!("Aufstieg: {from} → {to} ({extra})"),
            None => format!("Aufstieg: {from} → {to}"),
        };
        (
            RatingOutcome::Promoted { from, to, rated: target, value: carried },
            Some(note),
        )
    } else {
        attribute.level = level;
        attribute.numeric_value = target;
        let outcome = match previous {
            Some(previous) => RatingOutcome::Updated { previous, value: target },
            None => RatingOutcome::Created { value: target },
        };
        (outcome, coach_notes.map(str::to_string))
    };

    // promotions record the delta of the rated value, not of the carried one
    attribute.level_rating = attribute.numeric_value;
    attribute.progression_history.push(ProgressionEntry {
        value: attribute.numeric_value,
        change: previous.map_or(0, |p| target - p),
        notes,
        timestamp: now,
    });
    attribute.updated_at = now;

    Ok(outcome)
}

/// Works out the new main value without touching the attribute, so a
/// rejected update leaves it unchanged.
fn resolve_target(
    attribute: &PlayerAttribute,
    update: &AttributeUpdate,
) -> Result<(i32, BTreeMap<String, i32>), ApiError> {
    match &update.sub_attributes {
        Some(subs) if !subs.is_empty() => {
            let mut merged = attribute.sub_attributes.clone();
            for (name, value) in subs {
                let name = name.trim();
                if name.is_empty() {
                    return Err(ApiError::BadRequest(
                        "Unterattribut ohne Namen".to_string(),
                    ));
                }
                merged.insert(name.to_string(), clamp_rating(*value)?);
            }
            let target = average_rating(&merged).unwrap_or(MIN_RATING);
            Ok((target, merged))
        }
        _ => {
            let value = update.value.ok_or_else(|| {
                ApiError::BadRequest("Keine Bewertung angegeben".to_string())
            })?;
            Ok((clamp_rating(value)?, attribute.sub_attributes.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn attribute() -> PlayerAttribute {
        PlayerAttribute::new(Uuid::new_v4(), None, "Angriff", Utc::now())
    }

    fn value(v: f64) -> AttributeUpdate {
        AttributeUpdate { value: Some(v), ..Default::default() }
    }

    fn subs(pairs: &[(&str, f64)]) -> AttributeUpdate {
        AttributeUpdate {
            sub_attributes: Some(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn clamps_to_rating_range() {
        assert_eq!(clamp_rating(-20.0).unwrap(), 1);
        assert_eq!(clamp_rating(0.4).unwrap(), 1);
        assert_eq!(clamp_rating(55.5).unwrap(), 56);
        assert_eq!(clamp_rating(150.0).unwrap(), 99);
        assert!(clamp_rating(f64::NAN).is_err());
        assert!(clamp_rating(f64::INFINITY).is_err());
    }

    #[test]
    fn first_rating_creates_history_with_zero_change() {
        let mut attr = attribute();
        let outcome = apply_update(&mut attr, &value(42.0), Utc::now()).unwrap();

        assert_eq!(outcome, RatingOutcome::Created { value: 42 });
        assert_eq!(attr.numeric_value, 42);
        assert_eq!(attr.level_rating, 42);
        assert_eq!(attr.progression_history.len(), 1);
        assert_eq!(attr.progression_history[0].change, 0);
    }

    #[test]
    fn later_updates_record_the_delta() {
        let mut attr = attribute();
        apply_update(&mut attr, &value(50.0), Utc::now()).unwrap();
        let outcome = apply_update(&mut attr, &value(45.0), Utc::now()).unwrap();

        assert_eq!(outcome, RatingOutcome::Updated { previous: 50, value: 45 });
        assert_eq!(attr.progression_history.len(), 2);
        assert_eq!(attr.progression_history[1].change, -5);
        assert_eq!(attr.level, 0);
    }

    #[test]
    fn ninety_promotes_into_next_league_band() {
        let mut attr = attribute();
        apply_update(&mut attr, &value(80.0), Utc::now()).unwrap();
        let outcome = apply_update(&mut attr, &value(93.0), Utc::now()).unwrap();

        assert_eq!(
            outcome,
            RatingOutcome::Promoted {
                from: LeagueLevel::Kreisliga,
                to: LeagueLevel::Bezirksliga,
                rated: 93,
                value: 4
            }
        );
        assert_eq!(attr.level, 1);
        assert_eq!(attr.numeric_value, 4);
        assert_eq!(attr.level_rating, 4);

        let last = attr.progression_history.last().unwrap();
        assert_eq!(last.change, 93 - 80);
        assert!(last.notes.as_deref().unwrap().starts_with("Aufstieg: Kreisliga → Bezirksliga"));
    }

    #[test]
    fn bundesliga_keeps_high_values() {
        let mut attr = attribute();
        attr.level = MAX_LEVEL;
        apply_update(&mut attr, &value(70.0), Utc::now()).unwrap();
        let outcome = apply_update(&mut attr, &value(97.0), Utc::now()).unwrap();

        assert_eq!(outcome, RatingOutcome::Updated { previous: 70, value: 97 });
        assert_eq!(attr.level, MAX_LEVEL);
        assert_eq!(attr.numeric_value, 97);
    }

    #[test]
    fn level_stays_within_bounds_over_many_promotions() {
        let mut attr = attribute();
        for _ in 0..20 {
            apply_update(&mut attr, &value(99.0), Utc::now()).unwrap();
            assert!((0..=MAX_LEVEL).contains(&attr.level));
            assert!((MIN_RATING..=MAX_RATING).contains(&attr.numeric_value));
        }
        assert_eq!(attr.level, MAX_LEVEL);
        assert_eq!(attr.numeric_value, 99);
    }

    #[test]
    fn corrupted_negative_level_is_repaired() {
        let mut attr = attribute();
        attr.level = -2;
        apply_update(&mut attr, &value(30.0), Utc::now()).unwrap();
        assert_eq!(attr.level, 0);
    }

    #[test]
    fn sub_attributes_average_into_main_value() {
        let mut attr = attribute();
        apply_update(&mut attr, &subs(&[("Schnellangriff", 60.0), ("Hinterfeld", 71.0)]), Utc::now())
            .unwrap();
        assert_eq!(attr.numeric_value, 66);

        // merges with what is already stored
        apply_update(&mut attr, &subs(&[("Lob", 30.0)]), Utc::now()).unwrap();
        assert_eq!(attr.sub_attributes.len(), 3);
        assert_eq!(attr.numeric_value, 54);
    }

    #[test]
    fn sub_attributes_win_over_main_value() {
        let mut attr = attribute();
        let mut update = subs(&[("Sprungaufschlag", 20.0)]);
        update.value = Some(80.0);
        apply_update(&mut attr, &update, Utc::now()).unwrap();
        assert_eq!(attr.numeric_value, 20);
    }

    #[test]
    fn promotion_resets_sub_attributes_to_carried_value() {
        let mut attr = attribute();
        apply_update(&mut attr, &subs(&[("a", 95.0), ("b", 91.0)]), Utc::now()).unwrap();

        assert_eq!(attr.level, 1);
        assert_eq!(attr.numeric_value, 4);
        assert!(attr.sub_attributes.values().all(|v| *v == 4));
        assert_eq!(average_rating(&attr.sub_attributes), Some(attr.numeric_value));
    }

    #[test]
    fn rejected_update_leaves_attribute_untouched() {
        let mut attr = attribute();
        apply_update(&mut attr, &value(40.0), Utc::now()).unwrap();
        let before = attr.clone();

        assert!(apply_update(&mut attr, &AttributeUpdate::default(), Utc::now()).is_err());
        assert!(apply_update(&mut attr, &subs(&[("ok", 50.0), ("bad", f64::NAN)]), Utc::now()).is_err());
        assert!(apply_update(&mut attr, &subs(&[("  ", 50.0)]), Utc::now()).is_err());

        assert_eq!(attr.numeric_value, before.numeric_value);
        assert_eq!(attr.sub_attributes, before.sub_attributes);
        assert_eq!(attr.progression_history.len(), before.progression_history.len());
    }

    #[test]
    fn coach_notes_are_kept() {
        let mut attr = attribute();
        let update = AttributeUpdate {
            value: Some(61.0),
            notes: Some("  gute Technik  ".to_string()),
            ..Default::default()
        };
        apply_update(&mut attr, &update, Utc::now()).unwrap();
        assert_eq!(attr.progression_history[0].notes.as_deref(), Some("gute Technik"));
    }
}
