// file: src/database/workouts.rs
use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};

use crate::models::WorkoutRecord;

fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<WorkoutRecord> {
    let content: String = row.try_get("content")?;
    let content = serde_json::from_str(&content).unwrap_or_else(|e| {
        log::warn!("Malformed workout content payload, keeping as empty: {}", e);
        serde_json::json!({})
    });

    Ok(WorkoutRecord {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        period_id: row.try_get("period_id")?,
        date: row.try_get("date")?,
        time: row.try_get("time")?,
        category_name: row.try_get("category_name")?,
        title: row.try_get("title")?,
        content,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn create(pool: &SqlitePool, account_id: &str, record: &WorkoutRecord) -> Result<()> {
    let content = serde_json::to_string(&record.content).context("serializing workout content")?;

    sqlx::query(
        r#"
        INSERT INTO workouts (
            id, account_id, client_id, period_id, date, time,
            category_name, title, content, created_by, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(account_id)
    .bind(&record.client_id)
    .bind(&record.period_id)
    .bind(record.date)
    .bind(&record.time)
    .bind(&record.category_name)
    .bind(&record.title)
    .bind(content)
    .bind(&record.created_by)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await
    .context("Failed to insert workout")?;

    Ok(())
}

pub async fn get(pool: &SqlitePool, account_id: &str, id: &str) -> Result<Option<WorkoutRecord>> {
    let row = sqlx::query("SELECT * FROM workouts WHERE account_id = ? AND id = ?")
        .bind(account_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn delete(pool: &SqlitePool, account_id: &str, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM workouts WHERE account_id = ? AND id = ?")
        .bind(account_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn get_in_range(
    pool: &SqlitePool,
    account_id: &str,
    client_id: Option<&str>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<WorkoutRecord>> {
    let rows = match client_id {
        Some(client_id) => {
            sqlx::query(
                r#"
                SELECT * FROM workouts
                WHERE account_id = ? AND client_id = ? AND date >= ? AND date <= ?
                ORDER BY date ASC, time ASC, id ASC
                "#,
            )
            .bind(account_id)
            .bind(client_id)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                r#"
                SELECT * FROM workouts
                WHERE account_id = ? AND date >= ? AND date <= ?
                ORDER BY date ASC, time ASC, id ASC
                "#,
            )
            .bind(account_id)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter().map(from_row).collect()
}
