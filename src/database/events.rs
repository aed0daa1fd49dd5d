// file: src/database/events.rs
//
// Local mirror of calendar events. Remote events get mirrored here so
// their reconciliation metadata survives the external service being
// unreachable; purely local events live only here.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

use crate::matching::OWNED_PROP_KEYS;
use crate::models::{CalendarEvent, EventTime, EventUpdates};

fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<CalendarEvent> {
    let side_channel: String = row.try_get("side_channel")?;
    let side_channel: HashMap<String, String> =
        serde_json::from_str(&side_channel).unwrap_or_else(|e| {
            log::warn!("Malformed side-channel map, treating as empty: {}", e);
            HashMap::new()
        });

    let start = EventTime {
        date_time: row.try_get("start_time")?,
        date: row.try_get("start_date")?,
        time_zone: row.try_get("time_zone")?,
    };
    let end_time: Option<DateTime<Utc>> = row.try_get("end_time")?;
    let end = end_time.map(EventTime::at);

    Ok(CalendarEvent {
        id: row.try_get("id")?,
        summary: row.try_get("summary")?,
        description: row.try_get("description")?,
        location: row.try_get("location")?,
        start,
        end,
        html_link: row.try_get("html_link")?,
        side_channel,
        is_coaching_session: row.try_get("is_coaching_session")?,
        is_class_session: row.try_get("is_class_session")?,
        pre_configured_client: row.try_get("pre_configured_client")?,
        pre_configured_category: row.try_get("pre_configured_category")?,
        linked_workout_id: row.try_get("linked_workout_id")?,
    })
}

pub async fn upsert(pool: &SqlitePool, account_id: &str, event: &CalendarEvent) -> Result<()> {
    let side_channel =
        serde_json::to_string(&event.side_channel).context("serializing side-channel map")?;
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO calendar_events (
            id, account_id, summary, description, location,
            start_time, end_time, start_date, time_zone, html_link,
            side_channel, is_coaching_session, is_class_session,
            pre_configured_client, pre_configured_category, linked_workout_id,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            summary = excluded.summary,
            description = excluded.description,
            location = excluded.location,
            start_time = excluded.start_time,
            end_time = excluded.end_time,
            start_date = excluded.start_date,
            time_zone = excluded.time_zone,
            html_link = excluded.html_link,
            side_channel = excluded.side_channel,
            is_coaching_session = excluded.is_coaching_session,
            is_class_session = excluded.is_class_session,
            pre_configured_client = excluded.pre_configured_client,
            pre_configured_category = excluded.pre_configured_category,
            linked_workout_id = excluded.linked_workout_id,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&event.id)
    .bind(account_id)
    .bind(&event.summary)
    .bind(&event.description)
    .bind(&event.location)
    .bind(event.start.date_time)
    .bind(event.end.as_ref().and_then(|e| e.date_time))
    .bind(event.start.date)
    .bind(&event.start.time_zone)
    .bind(&event.html_link)
    .bind(side_channel)
    .bind(event.is_coaching_session)
    .bind(event.is_class_session)
    .bind(&event.pre_configured_client)
    .bind(&event.pre_configured_category)
    .bind(&event.linked_workout_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to upsert calendar event")?;

    Ok(())
}

pub async fn get(pool: &SqlitePool, account_id: &str, id: &str) -> Result<Option<CalendarEvent>> {
    let row = sqlx::query("SELECT * FROM calendar_events WHERE account_id = ? AND id = ?")
        .bind(account_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn get_in_range(
    pool: &SqlitePool,
    account_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<CalendarEvent>> {
    // All-day events have no start_time; they match on their calendar day.
    let rows = sqlx::query(
        r#"
        SELECT * FROM calendar_events
        WHERE account_id = ?
            AND (
                (start_time IS NOT NULL AND start_time >= ? AND start_time <= ?)
                OR (start_date IS NOT NULL AND start_date >= ? AND start_date <= ?)
            )
        ORDER BY start_time ASC, start_date ASC, id ASC
        "#,
    )
    .bind(account_id)
    .bind(start)
    .bind(end)
    .bind(start.date_naive())
    .bind(end.date_naive())
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// Apply write-path updates to the mirror row. The side-channel merge only
/// ever touches the keys it is given, and clearing removes the engine's
/// own keys and nothing else.
pub async fn apply_updates(
    pool: &SqlitePool,
    account_id: &str,
    event_id: &str,
    updates: &EventUpdates,
    clear_owned_side_channel: bool,
) -> Result<bool> {
    let Some(mut event) = get(pool, account_id, event_id).await? else {
        return Ok(false);
    };

    if let Some(description) = &updates.description {
        event.description = Some(description.clone());
    }
    if let Some(props) = &updates.side_channel {
        for (key, value) in props {
            event.side_channel.insert(key.clone(), value.clone());
        }
    }
    if clear_owned_side_channel {
        for key in OWNED_PROP_KEYS {
            event.side_channel.remove(key);
        }
    }
    if let Some(client) = &updates.pre_configured_client {
        event.pre_configured_client = client.clone();
    }
    if let Some(category) = &updates.pre_configured_category {
        event.pre_configured_category = category.clone();
    }
    if let Some(workout_id) = &updates.linked_workout_id {
        event.linked_workout_id = workout_id.clone();
    }

    upsert(pool, account_id, &event).await?;
    Ok(true)
}
