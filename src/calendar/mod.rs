// Calendar source integration: the client trait, the connectivity probe
// that selects the write path, and breaker/retry-guarded reads.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::warn;

use crate::error::{AppError, AppResult};
use crate::models::CalendarEvent;
use crate::utils::circuit_breaker::get_circuit_breaker;
use crate::utils::retry::{retry_with_backoff, RetryConfig};

pub mod client;
pub mod writer;

pub use client::{CalendarClient, EventUpdateRequest};
pub use writer::{select_writer, EventWriter, LocalEventWriter, RemoteEventWriter};

pub const SERVICE_NAME: &str = "calendar_source";

/// The probe gates which write path an assignment takes, so it must never
/// hang: a couple of seconds, then assume offline.
const CONNECTIVITY_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub async fn probe_connected(client: &dyn CalendarClient) -> bool {
    match tokio::time::timeout(CONNECTIVITY_PROBE_TIMEOUT, client.is_connected()).await {
        Ok(Ok(connected)) => connected,
        Ok(Err(e)) => {
            warn!("Connectivity check failed, assuming offline: {}", e.to_safe_string());
            false
        }
        Err(_) => {
            warn!("Connectivity check timed out, assuming offline");
            false
        }
    }
}

/// List events through the circuit breaker with retry. Read-path only —
/// writes go through the breaker but are never auto-retried.
pub async fn list_events_guarded(
    client: Arc<dyn CalendarClient>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    calendar_id: &str,
) -> AppResult<Vec<CalendarEvent>> {
    let breaker = get_circuit_breaker(SERVICE_NAME).await;
    let calendar_id = calendar_id.to_string();

    let result = breaker
        .execute(|| async move {
            let retry_config = RetryConfig::default();
            retry_with_backoff(&retry_config, move || {
                let client = client.clone();
                let calendar_id = calendar_id.clone();
                Box::pin(async move {
                    client
                        .list_events(start, end, &calendar_id)
                        .await
                        .map_err(anyhow::Error::new)
                })
            })
            .await
        })
        .await;

    result.map_err(AppError::from)
}
