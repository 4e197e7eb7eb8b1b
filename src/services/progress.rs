use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    models::{
        attribute::PlayerAttribute,
        player::Position,
        progress::{AttributeProgress, ProgressReport},
    },
    services::overall_rating::{compute_overall, effective_attributes},
};

pub fn build_report(
    player_id: Uuid,
    team_id: Option<Uuid>,
    position: Position,
    attributes: &[PlayerAttribute],
    since: Option<DateTime<Utc>>,
) -> ProgressReport {
    let effective = effective_attributes(attributes, team_id);
    let overall = compute_overall(&effective, position);

    let attributes = effective
        .iter()
        .map(|attribute| {
            let mut history: Vec<_> = attribute
                .progression_history
                .iter()
                .filter(|entry| since.map_or(true, |s| entry.timestamp >= s))
                .cloned()
                .collect();
            history.sort_by_key(|entry| entry.timestamp);

            let promotions = history
                .iter()
                .filter(|entry| entry.notes.as_deref().is_some_and(|n| n.starts_with("Aufstieg")))
                .count();

            AttributeProgress {
                attribute_name: attribute.attribute_name.clone(),
                universal: attribute.is_universal(),
                level: attribute.level,
                league: attribute.league(),
                value: attribute.numeric_value,
                total_change: history.iter().map(|entry| entry.change).sum(),
                promotions,
                history,
            }
        })
        .collect();

    ProgressReport {
        player_id,
        team_id,
        overall,
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{models::attribute::AttributeUpdate, services::rating_engine::apply_update};

    fn update(attr: &mut PlayerAttribute, value: f64, at: DateTime<Utc>) {
        apply_update(attr, &AttributeUpdate { value: Some(value), ..Default::default() }, at).unwrap();
    }

    #[test]
    fn report_sums_changes_inside_window() {
        let player = Uuid::new_v4();
        let start = Utc::now() - Duration::days(30);
        let mut angriff = PlayerAttribute::new(player, None, "Angriff", start);
        update(&mut angriff, 40.0, start);
        update(&mut angriff, 50.0, start + Duration::days(10));
        update(&mut angriff, 58.0, start + Duration::days(20));

        let report = build_report(player, None, Position::Universal, &[angriff.clone()], None);
        assert_eq!(report.attributes.len(), 1);
        assert_eq!(report.attributes[0].total_change, 18);
        assert_eq!(report.attributes[0].history.len(), 3);
        assert_eq!(report.overall.as_ref().map(|o| o.value), Some(58));

        let recent = build_report(player, None, Position::Universal, &[angriff], Some(start + Duration::days(15)));
        assert_eq!(recent.attributes[0].total_change, 8);
        assert_eq!(recent.attributes[0].history.len(), 1);
    }

    #[test]
    fn promotions_are_counted() {
        let player = Uuid::new_v4();
        let now = Utc::now();
        let mut block = PlayerAttribute::new(player, None, "Block", now);
        update(&mut block, 70.0, now);
        update(&mut block, 92.0, now + Duration::days(1));

        let report = build_report(player, None, Position::Mittelblocker, &[block], None);
        assert_eq!(report.attributes[0].promotions, 1);
        // 70 -> 92 is a gain even though the carried value restarts at 3
        assert_eq!(report.attributes[0].total_change, 22);
        assert_eq!(report.attributes[0].level, 1);
        assert_eq!(report.attributes[0].value, 3);
    }
}
