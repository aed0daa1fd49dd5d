// file: src/database/periods.rs
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::models::{PeriodDay, ProgramPeriod};

fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ProgramPeriod> {
    let days: String = row.try_get("days")?;
    let days: Vec<PeriodDay> = serde_json::from_str(&days).unwrap_or_else(|e| {
        log::warn!("Malformed period day list, treating as empty: {}", e);
        Vec::new()
    });

    Ok(ProgramPeriod {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        name: row.try_get("name")?,
        color: row.try_get("color")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        weekday_template_id: row.try_get("weekday_template_id")?,
        days,
    })
}

pub async fn upsert(pool: &SqlitePool, account_id: &str, period: &ProgramPeriod) -> Result<()> {
    let days = serde_json::to_string(&period.days).context("serializing period days")?;
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO periods (
            id, account_id, client_id, name, color, start_date, end_date,
            weekday_template_id, days, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            client_id = excluded.client_id,
            name = excluded.name,
            color = excluded.color,
            start_date = excluded.start_date,
            end_date = excluded.end_date,
            weekday_template_id = excluded.weekday_template_id,
            days = excluded.days,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&period.id)
    .bind(account_id)
    .bind(&period.client_id)
    .bind(&period.name)
    .bind(&period.color)
    .bind(period.start_date)
    .bind(period.end_date)
    .bind(&period.weekday_template_id)
    .bind(days)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to upsert period")?;

    Ok(())
}

pub async fn get_for_client(
    pool: &SqlitePool,
    account_id: &str,
    client_id: &str,
) -> Result<Vec<ProgramPeriod>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM periods
        WHERE account_id = ? AND client_id = ?
        ORDER BY start_date ASC, id ASC
        "#,
    )
    .bind(account_id)
    .bind(client_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

pub async fn delete(pool: &SqlitePool, account_id: &str, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM periods WHERE account_id = ? AND id = ?")
        .bind(account_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
