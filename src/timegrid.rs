// App-timezone-safe date and slot math. Every comparison between an event
// instant and a workout record's calendar day goes through this module by
// formatting both in the application timezone — never by comparing raw
// instants or trusting the host timezone.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::models::BusinessHours;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Los_Angeles;

const DEFAULT_MIN_HOUR: u32 = 7;
const DEFAULT_MAX_HOUR: u32 = 20;

/// Half-hour display bucket. Items are placed by `matches`, so an event
/// starting on the hour lands only in the full-hour slot even though it
/// spans visually into the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub hour: u32,
    pub minute: u32,
}

impl Slot {
    pub fn label(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }

    pub fn matches(&self, hour: u32, minute: u32) -> bool {
        if hour != self.hour {
            return false;
        }
        match minute {
            0 => self.minute == 0,
            30 => self.minute == 30,
            m => m >= self.minute && m < self.minute + 30,
        }
    }
}

/// The application timezone as an explicit value. Construct once from
/// configuration and pass it to everything that does date math; tests can
/// run several grids side by side.
#[derive(Debug, Clone, Copy)]
pub struct TimeGrid {
    tz: Tz,
}

impl Default for TimeGrid {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE)
    }
}

impl TimeGrid {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// `YYYY-MM-DD` in the application timezone.
    pub fn date_string(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.tz).format("%Y-%m-%d").to_string()
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    pub fn same_day(&self, instant: DateTime<Utc>, date: NaiveDate) -> bool {
        self.local_date(instant) == date
    }

    /// Hour and minute in the application timezone, for slot placement.
    pub fn clock(&self, instant: DateTime<Utc>) -> (u32, u32) {
        let local = instant.with_timezone(&self.tz);
        (local.hour(), local.minute())
    }

    pub fn time_string(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.tz).format("%H:%M").to_string()
    }

    /// Resolve a source event's timezone label. Sources sometimes report
    /// offset strings like "GMT-08:00" that are not IANA names; those and
    /// anything unparseable fall back to the application timezone.
    pub fn event_timezone(&self, label: Option<&str>) -> Tz {
        let Some(label) = label else {
            return self.tz;
        };
        let trimmed = label.trim();
        if trimmed.is_empty()
            || trimmed.starts_with("GMT")
            || trimmed.starts_with("UTC")
            || is_raw_offset(trimmed)
        {
            return self.tz;
        }
        trimmed.parse::<Tz>().unwrap_or_else(|_| {
            log::warn!("Unrecognized timezone label '{}', using app timezone", label);
            self.tz
        })
    }

    /// Instant for a local wall-clock time on a date. Times skipped by a
    /// DST transition resolve deterministically rather than failing.
    pub fn instant_at(&self, date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
        let naive = date
            .and_hms_opt(hour, minute, 0)
            .unwrap_or_else(|| date.and_hms_opt(0, 0, 0).unwrap());
        match self.tz.from_local_datetime(&naive) {
            chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
            chrono::LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
            chrono::LocalResult::None => Utc.from_utc_datetime(&naive),
        }
    }

    /// Half-hour slot starts spanning `[min_hour, max_hour)`, folded over
    /// every configured business day. Empty or inverted bounds fall back to
    /// the 07:00–20:00 default.
    pub fn slots_for_business_hours(&self, hours: Option<&BusinessHours>) -> Vec<Slot> {
        let (min_hour, max_hour) = business_hour_bounds(hours);
        let mut slots = Vec::with_capacity(((max_hour - min_hour) * 2) as usize);
        for hour in min_hour..max_hour {
            slots.push(Slot { hour, minute: 0 });
            slots.push(Slot { hour, minute: 30 });
        }
        slots
    }
}

fn is_raw_offset(label: &str) -> bool {
    let bytes = label.as_bytes();
    (bytes.first() == Some(&b'+') || bytes.first() == Some(&b'-'))
        && label[1..].chars().all(|c| c.is_ascii_digit() || c == ':')
}

fn business_hour_bounds(hours: Option<&BusinessHours>) -> (u32, u32) {
    let mut min_hour = 24;
    let mut max_hour = 0;
    if let Some(hours) = hours {
        for day in &hours.days_of_week {
            if let Some(day_hours) = hours.day_hours.get(day) {
                min_hour = min_hour.min(day_hours.start_hour);
                max_hour = max_hour.max(day_hours.end_hour);
            }
        }
    }
    if min_hour >= max_hour {
        (DEFAULT_MIN_HOUR, DEFAULT_MAX_HOUR)
    } else {
        (min_hour, max_hour.min(24))
    }
}

/// Number of half-hour slots an item spans, capped at 4 hours so one long
/// event cannot dominate the grid.
pub fn span_slots(duration_minutes: i64) -> usize {
    let slots = (duration_minutes.max(0) + 29) / 30;
    slots.clamp(1, 8) as usize
}

/// Weekday normalized to Monday=0..Sunday=6.
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_monday()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayHours;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn grid() -> TimeGrid {
        TimeGrid::new(chrono_tz::America::Los_Angeles)
    }

    #[test]
    fn test_date_string_uses_app_timezone() {
        // 02:00 UTC on March 5 is still March 4 in Los Angeles.
        let instant = Utc.with_ymd_and_hms(2024, 3, 5, 2, 0, 0).unwrap();
        assert_eq!(grid().date_string(instant), "2024-03-04");
        assert_eq!(
            grid().local_date(instant),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
        );
    }

    #[test]
    fn test_clock_in_app_timezone() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 4, 18, 30, 0).unwrap();
        assert_eq!(grid().clock(instant), (10, 30));
        assert_eq!(grid().time_string(instant), "10:30");
    }

    #[test]
    fn test_slot_matching_on_the_hour() {
        let full = Slot { hour: 10, minute: 0 };
        let half = Slot { hour: 10, minute: 30 };

        // minute=0 belongs to the full-hour slot only
        assert!(full.matches(10, 0));
        assert!(!half.matches(10, 0));

        // minute=30 belongs to the half-hour slot only
        assert!(half.matches(10, 30));
        assert!(!full.matches(10, 30));

        // other minutes fall into their containing bucket
        assert!(full.matches(10, 15));
        assert!(!half.matches(10, 15));
        assert!(half.matches(10, 45));
        assert!(!full.matches(10, 45));

        assert!(!full.matches(11, 0));
    }

    #[test]
    fn test_business_hours_single_day() {
        let hours = BusinessHours {
            days_of_week: vec![1, 2, 3, 4, 5],
            day_hours: HashMap::from([(
                1,
                DayHours {
                    start_hour: 9,
                    end_hour: 17,
                },
            )]),
        };
        let slots = grid().slots_for_business_hours(Some(&hours));
        assert_eq!(slots.len(), 16);
        assert_eq!(slots[0].label(), "09:00");
        assert_eq!(slots[15].label(), "16:30");
    }

    #[test]
    fn test_business_hours_fall_back_to_default() {
        let slots = grid().slots_for_business_hours(None);
        assert_eq!(slots[0].label(), "07:00");
        assert_eq!(slots.last().unwrap().label(), "19:30");

        let inverted = BusinessHours {
            days_of_week: vec![1],
            day_hours: HashMap::from([(
                1,
                DayHours {
                    start_hour: 18,
                    end_hour: 9,
                },
            )]),
        };
        let slots = grid().slots_for_business_hours(Some(&inverted));
        assert_eq!(slots[0].label(), "07:00");
    }

    #[test]
    fn test_span_slots_clamps() {
        assert_eq!(span_slots(0), 1);
        assert_eq!(span_slots(30), 1);
        assert_eq!(span_slots(31), 2);
        assert_eq!(span_slots(60), 2);
        assert_eq!(span_slots(90), 3);
        // 4-hour cap
        assert_eq!(span_slots(600), 8);
        assert_eq!(span_slots(-15), 1);
    }

    #[test]
    fn test_event_timezone_fallback() {
        let g = grid();
        assert_eq!(g.event_timezone(Some("America/New_York")), chrono_tz::America::New_York);
        assert_eq!(g.event_timezone(Some("GMT-08:00")), g.timezone());
        assert_eq!(g.event_timezone(Some("-08:00")), g.timezone());
        assert_eq!(g.event_timezone(Some("Not/AZone")), g.timezone());
        assert_eq!(g.event_timezone(None), g.timezone());
    }

    #[test]
    fn test_instant_at_round_trip() {
        let g = grid();
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let instant = g.instant_at(date, 10, 0);
        assert_eq!(g.clock(instant), (10, 0));
        assert_eq!(g.local_date(instant), date);
    }

    #[test]
    fn test_weekday_index_normalization() {
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()), 0); // Monday
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()), 6); // Sunday
    }
}
