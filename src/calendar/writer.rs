// Dual write paths for event metadata, modeled as a strategy selected by a
// capability probe: events from the external source go back through it when
// it is reachable, everything else lands in the local mirror.

use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::{CalendarEvent, EventUpdates};
use crate::utils::circuit_breaker::get_circuit_breaker;

use super::client::{CalendarClient, EventUpdateRequest};
use super::{probe_connected, SERVICE_NAME};

#[async_trait]
pub trait EventWriter: Send + Sync {
    fn label(&self) -> &'static str;

    async fn write(
        &self,
        event: &CalendarEvent,
        updates: EventUpdates,
        clear_side_channel: bool,
    ) -> AppResult<()>;
}

pub struct RemoteEventWriter {
    client: Arc<dyn CalendarClient>,
    calendar_id: String,
}

impl RemoteEventWriter {
    pub fn new(client: Arc<dyn CalendarClient>, calendar_id: impl Into<String>) -> Self {
        Self {
            client,
            calendar_id: calendar_id.into(),
        }
    }
}

#[async_trait]
impl EventWriter for RemoteEventWriter {
    fn label(&self) -> &'static str {
        "external"
    }

    async fn write(
        &self,
        event: &CalendarEvent,
        updates: EventUpdates,
        clear_side_channel: bool,
    ) -> AppResult<()> {
        let request = EventUpdateRequest {
            event_id: event.id.clone(),
            calendar_id: self.calendar_id.clone(),
            instance_date: event.start.date_time,
            updates,
            clear_side_channel,
        };

        // Through the breaker, but no retry: a failed metadata write is
        // reported as pending sync, not replayed behind the caller's back.
        let breaker = get_circuit_breaker(SERVICE_NAME).await;
        let client = self.client.clone();
        let result = breaker
            .execute(|| async move {
                client.update_event(request).await.map_err(anyhow::Error::new)
            })
            .await;

        result.map_err(|e| match e.downcast::<AppError>() {
            Ok(app_error) => app_error,
            Err(other) => AppError::Anyhow(other),
        })
    }
}

pub struct LocalEventWriter {
    db: Arc<Database>,
    account_id: String,
}

impl LocalEventWriter {
    pub fn new(db: Arc<Database>, account_id: impl Into<String>) -> Self {
        Self {
            db,
            account_id: account_id.into(),
        }
    }
}

#[async_trait]
impl EventWriter for LocalEventWriter {
    fn label(&self) -> &'static str {
        "local"
    }

    async fn write(
        &self,
        event: &CalendarEvent,
        updates: EventUpdates,
        clear_side_channel: bool,
    ) -> AppResult<()> {
        let existed = self
            .db
            .apply_event_updates(&self.account_id, &event.id, &updates, clear_side_channel)
            .await?;
        if !existed {
            // Normal for events that only live at the external source; the
            // linked workout still carries the assignment.
            debug!("No mirror row for event {}, skipping local update", event.id);
        }
        Ok(())
    }
}

/// Pick the write path for an event: external service when the event
/// originates there and the integration is currently reachable, the local
/// mirror otherwise.
pub async fn select_writer(
    event: &CalendarEvent,
    client: &Arc<dyn CalendarClient>,
    db: &Arc<Database>,
    account_id: &str,
    calendar_id: &str,
) -> Box<dyn EventWriter> {
    if event.is_remote() && probe_connected(client.as_ref()).await {
        Box::new(RemoteEventWriter::new(client.clone(), calendar_id))
    } else {
        Box::new(LocalEventWriter::new(db.clone(), account_id))
    }
}
