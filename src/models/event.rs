use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Start or end of a calendar event as the source reports it: a timed
/// instant with an optional source timezone label, or a bare date for
/// all-day events. The label is not trusted — see `TimeGrid::event_timezone`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventTime {
    pub date_time: Option<DateTime<Utc>>,
    pub date: Option<NaiveDate>,
    pub time_zone: Option<String>,
}

impl EventTime {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            date_time: Some(instant),
            date: None,
            time_zone: None,
        }
    }

    pub fn on(date: NaiveDate) -> Self {
        Self {
            date_time: None,
            date: Some(date),
            time_zone: None,
        }
    }
}

/// An event owned by the external calendar source. This engine never
/// mutates `id`, `start`, `end` or `summary` — only `description` and the
/// side-channel keys it owns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventTime,
    pub end: Option<EventTime>,
    /// Link back to the source's own UI; present only on events that
    /// originate from the external service.
    pub html_link: Option<String>,
    /// Opaque key-value map the source lets the app attach to the event.
    /// Keys prefixed `coachsync_` belong to this engine; everything else
    /// must be left untouched.
    pub side_channel: HashMap<String, String>,
    pub is_coaching_session: bool,
    pub is_class_session: bool,
    pub pre_configured_client: Option<String>,
    pub pre_configured_category: Option<String>,
    pub linked_workout_id: Option<String>,
}

/// Mutable subset of an event accepted by the write path.
#[derive(Debug, Clone, Default)]
pub struct EventUpdates {
    pub description: Option<String>,
    pub side_channel: Option<HashMap<String, String>>,
    pub pre_configured_client: Option<Option<String>>,
    pub pre_configured_category: Option<Option<String>>,
    pub linked_workout_id: Option<Option<String>>,
}

impl CalendarEvent {
    /// Events that originate from the external service carry a link back
    /// into it; purely local events never do.
    pub fn is_remote(&self) -> bool {
        self.html_link
            .as_deref()
            .map(|link| link.contains("calendar"))
            .unwrap_or(false)
    }

    pub fn start_instant(&self) -> Option<DateTime<Utc>> {
        self.start.date_time
    }

    pub fn duration_minutes(&self) -> Option<i64> {
        let start = self.start.date_time?;
        let end = self.end.as_ref()?.date_time?;
        Some((end - start).num_minutes())
    }
}
