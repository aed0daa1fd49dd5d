use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Canonical shape of the calendar sync configuration document. Historical
/// documents come in several legacy shapes; `config::normalize_sync_config`
/// migrates them into this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarSyncConfig {
    pub selected_calendar_id: Option<String>,
    pub coaching_keywords: Vec<String>,
    pub coaching_color: Option<String>,
    pub class_keywords: Vec<String>,
    pub class_color: Option<String>,
    pub exclusion_keywords: Vec<String>,
    pub location_abbreviations: Vec<LocationAbbreviation>,
    pub last_sync_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationAbbreviation {
    pub original: String,
    pub abbreviation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<bool>,
}

impl LocationAbbreviation {
    /// Ignored entries display the original, untouched.
    pub fn display(&self) -> &str {
        if self.ignored.unwrap_or(false) {
            &self.original
        } else {
            &self.abbreviation
        }
    }
}

/// Business-hour bounds consumed by the time grid. `days_of_week` uses the
/// source convention Sunday=0..Saturday=6; `day_hours` maps each configured
/// day to its open interval.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessHours {
    pub days_of_week: Vec<u8>,
    pub day_hours: HashMap<u8, DayHours>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DayHours {
    pub start_hour: u32,
    pub end_hour: u32,
}
