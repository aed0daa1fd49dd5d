use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::models::{CalendarEvent, EventUpdates};

/// Single update request against the external source. `instance_date`
/// targets one occurrence of a recurring event; the source rejects
/// single-instance updates without it.
#[derive(Debug, Clone)]
pub struct EventUpdateRequest {
    pub event_id: String,
    pub calendar_id: String,
    pub instance_date: Option<DateTime<Utc>>,
    pub updates: EventUpdates,
    pub clear_side_channel: bool,
}

/// The external calendar service, consumed as a black box. Transport and
/// auth live behind this trait; implementations are expected to surface
/// `AppError::Auth`/`AppError::PermissionDenied` for credential problems so
/// the write path can fall back to the local mirror.
#[async_trait]
pub trait CalendarClient: Send + Sync {
    async fn list_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        calendar_id: &str,
    ) -> AppResult<Vec<CalendarEvent>>;

    async fn update_event(&self, request: EventUpdateRequest) -> AppResult<()>;

    async fn is_connected(&self) -> AppResult<bool>;
}
