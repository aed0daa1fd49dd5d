// The assign/unassign state transition. "Assigned" is nothing more than
// the presence of correlation metadata on the event plus the workout
// record it names; both sides are remote resources, so every step here
// degrades rather than rolling back.

use futures::future::join_all;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::calendar::{select_writer, CalendarClient};
use crate::database::Database;
use crate::error::AppResult;
use crate::matching::{
    extract_category, has_linked_workout, linked_workout_id, CATEGORY_PROP_KEY, CLIENT_PROP_KEY,
    WORKOUT_PROP_KEY,
};
use crate::models::{
    AssignmentResult, BulkAssignmentResult, CalendarEvent, EventUpdates, ProgramPeriod,
    UnassignResult, WorkoutRecord, UNSCHEDULED_PERIOD_ID,
};
use crate::periods::{resolve_category_for_date, resolve_period};
use crate::timegrid::TimeGrid;
use crate::utils::logging::log_assignment;

pub mod description;
pub mod patterns;

pub use description::{build_updated_description, strip_assignment};
pub use patterns::{client_scheduled_patterns, detect_event_pattern, find_matching_events, EventPattern};

// Stable result codes; prose goes to the logs.
pub const ALREADY_LINKED: &str = "AlreadyLinked";
pub const REMOTE_SYNC_FAILED: &str = "RemoteSyncFailed";
pub const NOT_AUTHENTICATED: &str = "NotAuthenticated";
pub const MIRROR_SYNC_FAILED: &str = "MirrorSyncFailed";
pub const MISSING_START: &str = "MissingStart";

const DEFAULT_CATEGORY: &str = "General";

pub struct AssignmentService {
    db: Arc<Database>,
    client: Arc<dyn CalendarClient>,
    grid: TimeGrid,
    account_id: String,
    calendar_id: String,
}

impl AssignmentService {
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
        }
    }

    /// Re-read the event from the mirror so linked-state checks see the
    /// latest write, not whatever copy the caller has been holding. A prior
    /// partial success (record created, remote sync pending) is still a
    /// link; trusting a stale copy would create duplicate records.
    async fn freshest_event(&self, event: &CalendarEvent) -> CalendarEvent {
        match self.db.get_event(&self.account_id, &event.id).await {
            Ok(Some(fresh)) => fresh,
            Ok(None) => event.clone(),
            Err(e) => {
                warn!("Could not refresh event {}: {}; using caller's copy", event.id, e);
                event.clone()
            }
        }
    }

    pub async fn assign(
        &self,
        event: &CalendarEvent,
        client_id: &str,
        periods: &[ProgramPeriod],
        category_override: Option<&str>,
    ) -> AppResult<AssignmentResult> {
        let event = self.freshest_event(event).await;

        // Not idempotent-overwrite: the caller must unassign first.
        if has_linked_workout(&event) {
            return Ok(AssignmentResult::failure(&event.id, ALREADY_LINKED));
        }

        let (date, time) = match event.start.date_time {
            Some(instant) => (
                self.grid.local_date(instant),
                Some(self.grid.time_string(instant)),
            ),
            None => match event.start.date {
                Some(date) => (date, None),
                None => return Ok(AssignmentResult::failure(&event.id, MISSING_START)),
            },
        };

        let period_id = match resolve_period(date, client_id, periods) {
            Some(period) => period.id.clone(),
            None => {
                debug!(
                    "No period covers {} for client {}, filing under {}",
                    date, client_id, UNSCHEDULED_PERIOD_ID
                );
                UNSCHEDULED_PERIOD_ID.to_string()
            }
        };

        let category = category_override
            .map(str::to_string)
            .or_else(|| extract_category(&event))
            .or_else(|| resolve_category_for_date(date, client_id, periods).map(|c| c.category))
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let mut record = WorkoutRecord::new(client_id, &period_id, date, &category);
        record.time = time;
        record.title = if event.summary.is_empty() {
            "Session".to_string()
        } else {
            event.summary.clone()
        };

        // A store failure here propagates: no record was created, so there
        // is nothing to reconcile and nothing partial to report.
        self.db.create_workout(&self.account_id, &record).await?;

        let updated_description = build_updated_description(
            event.description.as_deref(),
            client_id,
            &category,
            &record.id,
            &period_id,
        );
        let updates = EventUpdates {
            description: Some(updated_description),
            side_channel: Some(HashMap::from([
                (CLIENT_PROP_KEY.to_string(), client_id.to_string()),
                (CATEGORY_PROP_KEY.to_string(), category.clone()),
                (WORKOUT_PROP_KEY.to_string(), record.id.clone()),
            ])),
            pre_configured_client: Some(Some(client_id.to_string())),
            pre_configured_category: Some(Some(category.clone())),
            linked_workout_id: Some(Some(record.id.clone())),
        };

        let writer = select_writer(
            &event,
            &self.client,
            &self.db,
            &self.account_id,
            &self.calendar_id,
        )
        .await;

        let write_warning = match writer.write(&event, updates.clone(), false).await {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    "Metadata write via {} path failed for event {}: {}",
                    writer.label(),
                    event.id,
                    e.to_safe_string()
                );
                if writer.label() == "external" {
                    if e.is_auth_failure() {
                        Some(NOT_AUTHENTICATED)
                    } else {
                        Some(REMOTE_SYNC_FAILED)
                    }
                } else {
                    Some(MIRROR_SYNC_FAILED)
                }
            }
        };

        // The mirror is updated on every path so the next freshest read
        // sees the link even while the remote sync is pending.
        if writer.label() == "external" {
            if let Err(e) = self
                .db
                .apply_event_updates(&self.account_id, &event.id, &updates, false)
                .await
            {
                warn!("Mirror update failed for event {}: {}", event.id, e);
            }
        }

        log_assignment(&event.id, client_id, &record.id);
        Ok(match write_warning {
            Some(warning) => AssignmentResult::partial(&event.id, &record.id, warning),
            None => AssignmentResult::success(&event.id, &record.id),
        })
    }

    /// Fan the single-event operation out over a batch, wait for all of
    /// them, and report each event's outcome independently. Per-item
    /// failures never fail the call.
    pub async fn assign_bulk(
        &self,
        events: &[CalendarEvent],
        client_id: &str,
        periods: &[ProgramPeriod],
    ) -> BulkAssignmentResult {
        let outcomes = join_all(
            events
                .iter()
                .map(|event| self.assign(event, client_id, periods, None)),
        )
        .await;

        let results = outcomes
            .into_iter()
            .zip(events)
            .map(|(outcome, event)| {
                outcome.unwrap_or_else(|e| AssignmentResult::failure(&event.id, e.to_safe_string()))
            })
            .collect();

        BulkAssignmentResult::from_results(results)
    }

    /// Remove the correlation: strip the metadata text, clear the owned
    /// side-channel keys, and (optionally) delete the linked record. The
    /// priority is removing the coach-visible assignment — a failed remote
    /// write lags, it does not block the local teardown. Safe to call
    /// twice; a second run finds nothing to remove and still succeeds.
    pub async fn unassign(
        &self,
        event: &CalendarEvent,
        delete_record: bool,
    ) -> AppResult<UnassignResult> {
        let event = self.freshest_event(event).await;

        // Resolve the link before any mutation clears the evidence.
        let linked_id = linked_workout_id(&event);

        let cleaned = strip_assignment(event.description.as_deref().unwrap_or(""));
        let updates = EventUpdates {
            // The source rejects empty descriptions on update; a single
            // space clears it in practice.
            description: Some(if cleaned.is_empty() { " ".to_string() } else { cleaned }),
            side_channel: None,
            pre_configured_client: Some(None),
            pre_configured_category: Some(None),
            linked_workout_id: Some(None),
        };

        let mut warning: Option<&str> = None;

        let writer = select_writer(
            &event,
            &self.client,
            &self.db,
            &self.account_id,
            &self.calendar_id,
        )
        .await;

        if let Err(e) = writer.write(&event, updates.clone(), true).await {
            warn!(
                "Unassign write via {} path failed for event {}: {}",
                writer.label(),
                event.id,
                e.to_safe_string()
            );
            warning = Some(if writer.label() == "external" {
                if e.is_auth_failure() {
                    NOT_AUTHENTICATED
                } else {
                    REMOTE_SYNC_FAILED
                }
            } else {
                MIRROR_SYNC_FAILED
            });
        }

        // Clear the mirror regardless of how the remote write went.
        if writer.label() == "external" {
            if let Err(e) = self
                .db
                .apply_event_updates(&self.account_id, &event.id, &updates, true)
                .await
            {
                warn!("Mirror clear failed for event {}: {}", event.id, e);
            }
        }

        if delete_record {
            if let Some(workout_id) = linked_id {
                match self.db.delete_workout(&self.account_id, &workout_id).await {
                    Ok(true) => info!("Deleted workout {} for event {}", workout_id, event.id),
                    Ok(false) => debug!("Workout {} already gone", workout_id),
                    Err(e) => {
                        warn!("Could not delete workout {}: {}", workout_id, e);
                        warning = warning.or(Some("RecordDeleteFailed"));
                    }
                }
            }
        }

        Ok(match warning {
            Some(warning) => UnassignResult::with_warning(warning),
            None => UnassignResult::success(),
        })
    }
}
