use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::CalendarEvent;
use super::workout::WorkoutRecord;

/// How an entry in the unified day view was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Paired,
    EventOnly,
    RecordOnly,
}

/// One row of the unified schedule view: a correlated event+record pair or
/// an unmatched half. Derived fresh per query, never persisted.
#[derive(Debug, Clone)]
pub struct UnifiedEntry {
    pub kind: EntryKind,
    pub event: Option<CalendarEvent>,
    pub record: Option<WorkoutRecord>,
    pub sort_instant: DateTime<Utc>,
}

/// Outcome of a single assign operation. `error` carries a stable code for
/// normal negative outcomes; `warning` reports degraded success (workout
/// created, remote metadata sync pending).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub event_id: String,
    pub workout_id: Option<String>,
    pub success: bool,
    pub error: Option<String>,
    pub warning: Option<String>,
}

impl AssignmentResult {
    pub fn success(event_id: impl Into<String>, workout_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            workout_id: Some(workout_id.into()),
            success: true,
            error: None,
            warning: None,
        }
    }

    pub fn partial(
        event_id: impl Into<String>,
        workout_id: impl Into<String>,
        warning: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            workout_id: Some(workout_id.into()),
            success: true,
            error: None,
            warning: Some(warning.into()),
        }
    }

    pub fn failure(event_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            workout_id: None,
            success: false,
            error: Some(error.into()),
            warning: None,
        }
    }
}

/// Aggregate outcome of a bulk assignment. Per-item failures never fail the
/// batch; callers read the counts and drill into `results` for detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAssignmentResult {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
    pub results: Vec<AssignmentResult>,
}

impl BulkAssignmentResult {
    pub fn from_results(results: Vec<AssignmentResult>) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        let failed = results.len() - successful;
        Self {
            successful,
            failed,
            total: results.len(),
            results,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnassignResult {
    pub success: bool,
    pub error: Option<String>,
    pub warning: Option<String>,
}

impl UnassignResult {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
            warning: None,
        }
    }

    pub fn with_warning(warning: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            warning: Some(warning.into()),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            warning: None,
        }
    }
}
