// Period and day-category resolution. Dates are compared as calendar days
// in the application timezone, never as instants, so a period boundary
// never shifts across a timezone edge.

use chrono::NaiveDate;

use crate::models::{DayCategory, ProgramPeriod};
use crate::timegrid::weekday_index;

/// Find the period covering a date for a client. Bounds are inclusive.
pub fn resolve_period<'a>(
    date: NaiveDate,
    client_id: &str,
    periods: &'a [ProgramPeriod],
) -> Option<&'a ProgramPeriod> {
    periods
        .iter()
        .find(|period| period.client_id == client_id && period.contains(date))
}

/// Resolve the day category for a date.
///
/// An exact-date entry always wins, even when a weekday entry would match
/// the same date. Weekday matching applies only to template-generated
/// periods (those carrying `weekday_template_id`); a hand-built period
/// yields no category for dates it doesn't name, regardless of what else
/// is in its day list.
pub fn resolve_category_for_date(
    date: NaiveDate,
    client_id: &str,
    periods: &[ProgramPeriod],
) -> Option<DayCategory> {
    let period = resolve_period(date, client_id, periods)?;

    if let Some(day) = period.days.iter().find(|day| day.date == date) {
        return Some(day.into());
    }

    if period.weekday_template_id.is_some() {
        let target = weekday_index(date);
        return period
            .days
            .iter()
            .find(|day| day.weekday_index() == target)
            .map(Into::into);
    }

    None
}
