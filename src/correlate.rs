// Unified day view: correlates calendar events with workout records for a
// visible window without a reliable foreign key. Matching is greedy and
// deterministic — the first event in chronological order claims an
// ambiguous record, and sorted inputs make repeated runs identical.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::matching::{extract_client_id, linked_workout_id};
use crate::models::{CalendarEvent, EntryKind, UnifiedEntry, WorkoutRecord};
use crate::timegrid::TimeGrid;

/// Which items a view shows. The two "all clients" contexts are mutually
/// exclusive lenses, not a merged mode: `AllSessions` is the full schedule,
/// `PersonalOnly` is only events with no resolvable client identity (and
/// therefore never any workout records, which always belong to a client).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientLens {
    Client(String),
    AllSessions,
    PersonalOnly,
}

/// Untimed records sort at this app-local hour so they land after timed
/// items but stay visible. Display policy, not a rule — override with
/// `with_untimed_placeholder_hour`.
pub const DEFAULT_UNTIMED_SORT_HOUR: u32 = 18;

pub struct Correlator {
    grid: TimeGrid,
    untimed_sort_hour: u32,
}

impl Correlator {
    pub fn new(grid: TimeGrid) -> Self {
        Self {
            grid,
            untimed_sort_hour: DEFAULT_UNTIMED_SORT_HOUR,
        }
    }

    pub fn with_untimed_placeholder_hour(mut self, hour: u32) -> Self {
        self.untimed_sort_hour = hour.min(23);
        self
    }

    fn event_visible(&self, event: &CalendarEvent, lens: &ClientLens) -> bool {
        let identity = extract_client_id(event);
        match lens {
            ClientLens::Client(client_id) => identity.as_deref() == Some(client_id.as_str()),
            ClientLens::AllSessions => true,
            ClientLens::PersonalOnly => identity.is_none(),
        }
    }

    fn record_visible(&self, record: &WorkoutRecord, lens: &ClientLens) -> bool {
        match lens {
            ClientLens::Client(client_id) => &record.client_id == client_id,
            ClientLens::AllSessions => true,
            ClientLens::PersonalOnly => false,
        }
    }

    fn event_day(&self, event: &CalendarEvent) -> Option<NaiveDate> {
        match event.start.date_time {
            Some(instant) => Some(self.grid.local_date(instant)),
            None => event.start.date,
        }
    }

    fn event_sort_instant(&self, event: &CalendarEvent, date: NaiveDate) -> DateTime<Utc> {
        event
            .start
            .date_time
            .unwrap_or_else(|| self.grid.instant_at(date, 0, 0))
    }

    fn record_sort_instant(&self, record: &WorkoutRecord) -> DateTime<Utc> {
        match record.time_of_day() {
            Some((hour, minute)) => self.grid.instant_at(record.date, hour, minute),
            None => self.grid.instant_at(record.date, self.untimed_sort_hour, 0),
        }
    }

    /// Build the unified, time-sorted view of a window. Produced fresh per
    /// query; entries are never cached or persisted.
    pub fn unify_window(
        &self,
        events: &[CalendarEvent],
        records: &[WorkoutRecord],
        lens: &ClientLens,
    ) -> Vec<UnifiedEntry> {
        let mut events_by_day: BTreeMap<NaiveDate, Vec<&CalendarEvent>> = BTreeMap::new();
        for event in events.iter().filter(|e| self.event_visible(e, lens)) {
            if let Some(date) = self.event_day(event) {
                events_by_day.entry(date).or_default().push(event);
            }
        }

        let mut records_by_day: BTreeMap<NaiveDate, Vec<&WorkoutRecord>> = BTreeMap::new();
        for record in records.iter().filter(|r| self.record_visible(r, lens)) {
            records_by_day.entry(record.date).or_default().push(record);
        }

        let days: BTreeSet<NaiveDate> = events_by_day
            .keys()
            .chain(records_by_day.keys())
            .copied()
            .collect();

        let mut entries = Vec::new();
        for day in days {
            entries.extend(self.unify_day(
                day,
                events_by_day.remove(&day).unwrap_or_default(),
                records_by_day.remove(&day).unwrap_or_default(),
            ));
        }
        entries
    }

    fn unify_day(
        &self,
        date: NaiveDate,
        mut events: Vec<&CalendarEvent>,
        mut records: Vec<&WorkoutRecord>,
    ) -> Vec<UnifiedEntry> {
        // Sorted inputs, not collection order: pairing below is greedy, so
        // the iteration order decides which event claims an ambiguous
        // record and must be the same on every run.
        events.sort_by(|a, b| {
            self.event_sort_instant(a, date)
                .cmp(&self.event_sort_instant(b, date))
                .then_with(|| a.id.cmp(&b.id))
        });
        records.sort_by(|a, b| {
            self.record_sort_instant(a)
                .cmp(&self.record_sort_instant(b))
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut used: HashSet<&str> = HashSet::new();
        let mut entries = Vec::new();

        for event in &events {
            let mut matched: Option<&WorkoutRecord> = None;

            // Direct link wins
            if let Some(direct_id) = linked_workout_id(event) {
                matched = records
                    .iter()
                    .find(|r| r.id == direct_id && !used.contains(r.id.as_str()))
                    .copied();
            }

            // Heuristic: same resolved client, record not yet claimed
            if matched.is_none() {
                if let Some(client_id) = extract_client_id(event) {
                    matched = records
                        .iter()
                        .find(|r| r.client_id == client_id && !used.contains(r.id.as_str()))
                        .copied();
                }
            }

            let sort_instant = self.event_sort_instant(event, date);
            match matched {
                Some(record) => {
                    used.insert(record.id.as_str());
                    entries.push(UnifiedEntry {
                        kind: EntryKind::Paired,
                        event: Some((*event).clone()),
                        record: Some(record.clone()),
                        sort_instant,
                    });
                }
                None => entries.push(UnifiedEntry {
                    kind: EntryKind::EventOnly,
                    event: Some((*event).clone()),
                    record: None,
                    sort_instant,
                }),
            }
        }

        for record in &records {
            if !used.contains(record.id.as_str()) {
                entries.push(UnifiedEntry {
                    kind: EntryKind::RecordOnly,
                    event: None,
                    record: Some((*record).clone()),
                    sort_instant: self.record_sort_instant(record),
                });
            }
        }

        entries.sort_by(|a, b| {
            a.sort_instant
                .cmp(&b.sort_instant)
                .then_with(|| entry_key(a).cmp(entry_key(b)))
        });
        entries
    }
}

fn entry_key(entry: &UnifiedEntry) -> &str {
    entry
        .event
        .as_ref()
        .map(|e| e.id.as_str())
        .or_else(|| entry.record.as_ref().map(|r| r.id.as_str()))
        .unwrap_or("")
}
