/*
Eager materialisation of recurring events: one document per occurrence,
all linked through a shared group id.
*/

use chrono::{DateTime, Duration, Months, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::event::{Event, RecurrenceFrequency, RecurrencePattern},
};

pub const MAX_OCCURRENCES: usize = 52;

/// Resolves a local wall-clock time. Times inside a DST gap move forward by
/// the length of the gap.
fn from_local(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|local| local.with_timezone(&Utc))
}

fn shift_local(time: DateTime<Utc>, offset: Duration, tz: Tz) -> Option<DateTime<Utc>> {
    from_local(time.with_timezone(&tz).naive_local() + offset, tz)
}

/// Local offset of every occurrence from the first one. Steps are taken in
/// `tz` wall-clock time, so a series keeps its local start time across DST.
fn local_offsets(start: DateTime<Utc>, pattern: &RecurrencePattern, tz: Tz) -> Result<Vec<Duration>, ApiError> {
    if pattern.until < start {
        return Err(ApiError::BadRequest(
            "Das Enddatum der Serie liegt vor dem ersten Termin".to_string(),
        ));
    }

    let first = start.with_timezone(&tz).naive_local();
    let mut offsets = Vec::new();
    for n in 0..MAX_OCCURRENCES as u32 {
        // offsets are taken from the first start so monthly dates do not drift
        let next = match pattern.frequency {
            RecurrenceFrequency::Weekly => Some(first + Duration::weeks(i64::from(n))),
            RecurrenceFrequency::Biweekly => Some(first + Duration::weeks(2 * i64::from(n))),
            RecurrenceFrequency::Monthly => first.checked_add_months(Months::new(n)),
        };
        match next.and_then(|next| from_local(next, tz).map(|utc| (next, utc))) {
            Some((next, utc)) if utc <= pattern.until => offsets.push(next - first),
            _ => break,
        }
    }

    Ok(offsets)
}

/// Start times of every occurrence, the first being `start` itself.
pub fn occurrence_starts(
    start: DateTime<Utc>,
    pattern: &RecurrencePattern,
    tz: Tz,
) -> Result<Vec<DateTime<Utc>>, ApiError> {
    Ok(local_offsets(start, pattern, tz)?
        .into_iter()
        .filter_map(|offset| shift_local(start, offset, tz))
        .collect())
}

/// Expands `base` into its series. Every instance copies the base fields,
/// gets its own id, and has start, end and voting deadline shifted by the
/// same local offset.
pub fn materialize(base: Event, pattern: &RecurrencePattern, tz: Tz) -> Result<Vec<Event>, ApiError> {
    let offsets = local_offsets(base.start_time, pattern, tz)?;
    let group_id = Uuid::new_v4();

    let events = offsets
        .into_iter()
        .enumerate()
        .filter_map(|(index, offset)| {
            let mut instance = base.clone();
            if index > 0 {
                instance.id = Uuid::new_v4();
            }
            instance.recurring_group_id = Some(group_id);
            instance.start_time = shift_local(base.start_time, offset, tz)?;
            instance.end_time = shift_local(base.end_time, offset, tz)?;
            instance.voting_deadline = match base.voting_deadline {
                Some(deadline) => Some(shift_local(deadline, offset, tz)?),
                None => None,
            };
            Some(instance)
        })
        .collect();

    Ok(events)
}
