use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A training session owned by this application. The `content` payload
/// (movements, sets, reps) is opaque to the reconciliation core and is
/// carried through the store untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub id: String,
    pub client_id: String,
    pub period_id: String,
    /// Calendar day in the application timezone.
    pub date: NaiveDate,
    /// Optional "HH:MM" local-to-app start time.
    pub time: Option<String>,
    pub category_name: String,
    pub title: String,
    pub content: serde_json::Value,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkoutRecord {
    pub fn new(
        client_id: impl Into<String>,
        period_id: impl Into<String>,
        date: NaiveDate,
        category_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            client_id: client_id.into(),
            period_id: period_id.into(),
            date,
            time: None,
            category_name: category_name.into(),
            title: String::new(),
            content: serde_json::json!({ "rounds": [], "warmups": [] }),
            created_by: "system".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Parse the optional "HH:MM" field. Malformed values read as absent.
    pub fn time_of_day(&self) -> Option<(u32, u32)> {
        let time = self.time.as_deref()?;
        let (h, m) = time.split_once(':')?;
        let hour: u32 = h.trim().parse().ok()?;
        let minute: u32 = m.trim().parse().ok()?;
        if hour > 23 || minute > 59 {
            return None;
        }
        Some((hour, minute))
    }
}
