// Window fetches for the schedule view. Rapid navigation fires many
// overlapping range requests; only the newest one may apply. Each request
// cancels its predecessor's token, and the token is checked before every
// point where results would be applied, so a stale fetch returns `None`
// instead of clobbering newer state.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::calendar::{list_events_guarded, probe_connected, CalendarClient};
use crate::database::Database;
use crate::error::AppResult;
use crate::matching::extract_client_id;
use crate::models::{CalendarEvent, WorkoutRecord};
use crate::timegrid::TimeGrid;
use crate::utils::logging::log_window_fetch;

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct WindowRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub client_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WindowData {
    pub events: Vec<CalendarEvent>,
    pub records: Vec<WorkoutRecord>,
}

pub struct WindowFetcher {
    db: Arc<Database>,
    client: Arc<dyn CalendarClient>,
    grid: TimeGrid,
    account_id: String,
    calendar_id: String,
    debounce: Duration,
    current: Mutex<CancellationToken>,
}

impl WindowFetcher {
    pub fn new(
        db: Arc<Database>,
        client: Arc<dyn CalendarClient>,
        grid: TimeGrid,
        account_id: impl Into<String>,
        calendar_id: impl Into<String>,
    ) -> Self {
        Self {
            db,
            client,
            grid,
            account_id: account_id.into(),
            calendar_id: calendar_id.into(),
            debounce: DEFAULT_DEBOUNCE,
            current: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Fetch events and workout records for a window. Returns `Ok(None)`
    /// when a newer request superseded this one; the caller discards it.
    pub async fn fetch(&self, request: WindowRequest) -> AppResult<Option<WindowData>> {
        let token = {
            let mut current = self.current.lock().await;
            current.cancel();
            let token = CancellationToken::new();
            *current = token.clone();
            token
        };

        tokio::select! {
            _ = tokio::time::sleep(self.debounce) => {}
            _ = token.cancelled() => {
                debug!("Window fetch superseded during debounce");
                return Ok(None);
            }
        }

        let started = Instant::now();

        let events = self.fetch_events(&request).await?;
        if token.is_cancelled() {
            debug!("Window fetch superseded after event load");
            return Ok(None);
        }

        let start_date = self.grid.local_date(request.start);
        let end_date = self.grid.local_date(request.end);
        let records = self
            .db
            .workouts_in_range(
                &self.account_id,
                request.client_id.as_deref(),
                start_date,
                end_date,
            )
            .await?;
        if token.is_cancelled() {
            debug!("Window fetch superseded after record load");
            return Ok(None);
        }

        log_window_fetch(events.len(), records.len(), started.elapsed().as_millis() as u64);
        Ok(Some(WindowData { events, records }))
    }

    /// Events for the window: the remote list when the source is reachable,
    /// overlaid on the local mirror so purely local events stay visible and
    /// not-yet-synced assignment metadata isn't lost from the view.
    async fn fetch_events(&self, request: &WindowRequest) -> AppResult<Vec<CalendarEvent>> {
        let mirror = self
            .db
            .events_in_range(&self.account_id, request.start, request.end)
            .await?;

        if probe_connected(self.client.as_ref()).await {
            match list_events_guarded(
                self.client.clone(),
                request.start,
                request.end,
                &self.calendar_id,
            )
            .await
            {
                Ok(remote) => return Ok(merge_events(remote, mirror)),
                Err(e) => {
                    warn!(
                        "Remote event list failed, serving mirror only: {}",
                        e.to_safe_string()
                    );
                }
            }
        }

        Ok(mirror)
    }
}

fn merge_events(remote: Vec<CalendarEvent>, mirror: Vec<CalendarEvent>) -> Vec<CalendarEvent> {
    let mut merged = remote;

    for mirror_event in mirror {
        match merged.iter_mut().find(|e| e.id == mirror_event.id) {
            Some(remote_event) => {
                // The source is authoritative for time/title, but the
                // mirror may carry assignment metadata the source hasn't
                // accepted yet (offline assignment).
                if extract_client_id(remote_event).is_none()
                    && extract_client_id(&mirror_event).is_some()
                {
                    remote_event.description = mirror_event.description.clone();
                    remote_event.side_channel = mirror_event.side_channel.clone();
                    remote_event.pre_configured_client = mirror_event.pre_configured_client.clone();
                    remote_event.pre_configured_category =
                        mirror_event.pre_configured_category.clone();
                    remote_event.linked_workout_id = mirror_event.linked_workout_id.clone();
                }
            }
            None => merged.push(mirror_event),
        }
    }

    merged.sort_by(|a, b| {
        a.start
            .date_time
            .cmp(&b.start.date_time)
            .then_with(|| a.start.date.cmp(&b.start.date))
            .then_with(|| a.id.cmp(&b.id))
    });
    merged
}
