// Day-of-week + start-time patterns. A coach assigning a client to their
// "Mondays at 07:00" slot wants every matching unassigned event in one
// action; these helpers find them.

use chrono::NaiveDate;

use crate::matching::extract_client_id;
use crate::models::{CalendarEvent, ProgramPeriod};
use crate::timegrid::{weekday_index, TimeGrid};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPattern {
    /// Monday=0..Sunday=6
    pub weekday: u32,
    /// "HH:MM" in the application timezone
    pub time: String,
}

pub fn detect_event_pattern(event: &CalendarEvent, grid: &TimeGrid) -> Option<EventPattern> {
    let instant = event.start.date_time?;
    Some(EventPattern {
        weekday: weekday_index(grid.local_date(instant)),
        time: grid.time_string(instant),
    })
}

/// Unassigned events matching a pattern. Events that already resolve to a
/// client are never candidates for bulk assignment.
pub fn find_matching_events<'a>(
    events: &'a [CalendarEvent],
    pattern: &EventPattern,
    grid: &TimeGrid,
    exclude_event_ids: &[&str],
) -> Vec<&'a CalendarEvent> {
    events
        .iter()
        .filter(|event| {
            if exclude_event_ids.contains(&event.id.as_str()) {
                return false;
            }
            if extract_client_id(event).is_some() {
                return false;
            }
            detect_event_pattern(event, grid).as_ref() == Some(pattern)
        })
        .collect()
}

/// Recurring day/time patterns from a client's current and future periods,
/// de-duplicated in first-seen order.
pub fn client_scheduled_patterns(periods: &[ProgramPeriod], today: NaiveDate) -> Vec<EventPattern> {
    let mut patterns = Vec::new();
    for period in periods {
        if period.end_date < today {
            continue;
        }
        for day in &period.days {
            if day.is_all_day {
                continue;
            }
            let Some(time) = &day.time else {
                continue;
            };
            let pattern = EventPattern {
                weekday: day.weekday_index(),
                time: time.clone(),
            };
            if !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }
    }
    patterns
}
