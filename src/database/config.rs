// file: src/database/config.rs
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Row, SqlitePool};

pub async fn get(
    pool: &SqlitePool,
    account_id: &str,
    doc_id: &str,
) -> Result<Option<serde_json::Value>> {
    let row = sqlx::query("SELECT data FROM configuration WHERE account_id = ? AND doc_id = ?")
        .bind(account_id)
        .bind(doc_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let data: String = row.try_get("data")?;
            let value = serde_json::from_str(&data)
                .with_context(|| format!("Malformed configuration document {}", doc_id))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub async fn put(
    pool: &SqlitePool,
    account_id: &str,
    doc_id: &str,
    data: &serde_json::Value,
) -> Result<()> {
    let payload = serde_json::to_string(data).context("serializing configuration document")?;

    sqlx::query(
        r#"
        INSERT INTO configuration (doc_id, account_id, data, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(doc_id) DO UPDATE SET
            data = excluded.data,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(doc_id)
    .bind(account_id)
    .bind(payload)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to upsert configuration document")?;

    Ok(())
}
