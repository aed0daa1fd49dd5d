// file: src/database/mod.rs

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePool, Sqlite};

use crate::models::{CalendarEvent, EventUpdates, ProgramPeriod, WorkoutRecord};

// Declare submodules
pub mod config;
pub mod events;
pub mod periods;
pub mod workouts;

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new() -> Result<Self> {
        Self::connect("sqlite:coachsync.db?mode=rwc").await
    }

    pub async fn connect(db_path: &str) -> Result<Self> {
        let db_exists = Sqlite::database_exists(db_path)
            .await
            .context("Failed to check if database exists")?;
        if !db_exists {
            info!("Creating database");
            Sqlite::create_database(db_path)
                .await
                .context("Failed to create database")?;
        }

        let pool = SqlitePool::connect(db_path)
            .await
            .context("Failed to connect to database")?;

        run_schema(&pool).await.context("Failed to run database schema")?;

        info!("Database initialized successfully");

        Ok(Database { pool })
    }

    // --- Workout Delegates ---

    pub async fn create_workout(&self, account_id: &str, record: &WorkoutRecord) -> Result<()> {
        workouts::create(&self.pool, account_id, record).await
    }

    pub async fn get_workout(&self, account_id: &str, id: &str) -> Result<Option<WorkoutRecord>> {
        workouts::get(&self.pool, account_id, id).await
    }

    /// Returns false when the record was already gone; deletion is
    /// idempotent by design.
    pub async fn delete_workout(&self, account_id: &str, id: &str) -> Result<bool> {
        workouts::delete(&self.pool, account_id, id).await
    }

    pub async fn workouts_in_range(
        &self,
        account_id: &str,
        client_id: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WorkoutRecord>> {
        workouts::get_in_range(&self.pool, account_id, client_id, start, end).await
    }

    // --- Period Delegates ---

    pub async fn upsert_period(&self, account_id: &str, period: &ProgramPeriod) -> Result<()> {
        periods::upsert(&self.pool, account_id, period).await
    }

    pub async fn periods_for_client(
        &self,
        account_id: &str,
        client_id: &str,
    ) -> Result<Vec<ProgramPeriod>> {
        periods::get_for_client(&self.pool, account_id, client_id).await
    }

    pub async fn delete_period(&self, account_id: &str, id: &str) -> Result<bool> {
        periods::delete(&self.pool, account_id, id).await
    }

    // --- Calendar Event Mirror Delegates ---

    pub async fn upsert_event(&self, account_id: &str, event: &CalendarEvent) -> Result<()> {
        events::upsert(&self.pool, account_id, event).await
    }

    pub async fn get_event(&self, account_id: &str, id: &str) -> Result<Option<CalendarEvent>> {
        events::get(&self.pool, account_id, id).await
    }

    pub async fn events_in_range(
        &self,
        account_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        events::get_in_range(&self.pool, account_id, start, end).await
    }

    /// Returns false when no mirror row exists for the event, which is
    /// normal for events that only live at the external source.
    pub async fn apply_event_updates(
        &self,
        account_id: &str,
        event_id: &str,
        updates: &EventUpdates,
        clear_owned_side_channel: bool,
    ) -> Result<bool> {
        events::apply_updates(&self.pool, account_id, event_id, updates, clear_owned_side_channel)
            .await
    }

    // --- Configuration Delegates ---

    pub async fn get_config_doc(
        &self,
        account_id: &str,
        doc_id: &str,
    ) -> crate::error::AppResult<Option<serde_json::Value>> {
        config::get(&self.pool, account_id, doc_id)
            .await
            .map_err(Into::into)
    }

    pub async fn put_config_doc(
        &self,
        account_id: &str,
        doc_id: &str,
        data: &serde_json::Value,
    ) -> crate::error::AppResult<()> {
        config::put(&self.pool, account_id, doc_id, data)
            .await
            .map_err(Into::into)
    }
}

pub async fn run_schema(pool: &SqlitePool) -> Result<()> {
    let schema = include_str!("schema.sql");

    let mut current_statement = String::new();

    for line in schema.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") || trimmed.is_empty() {
            continue;
        }

        current_statement.push_str(line);
        current_statement.push('\n');

        if trimmed.ends_with(';') {
            sqlx::query(&current_statement).execute(pool).await?;
            current_statement.clear();
        }
    }

    Ok(())
}
