use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Period id used when an assignment lands on a date no program period
/// covers. Records filed here show up in the client's ad-hoc bucket
/// instead of failing the assignment.
pub const UNSCHEDULED_PERIOD_ID: &str = "quick-workouts";

/// A date range within a client's program, subdivided into day-level
/// category assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramPeriod {
    pub id: String,
    pub client_id: String,
    pub name: String,
    pub color: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Set only on periods generated from a weekly template. Gates weekday
    /// recurrence in category resolution: without it, a date with no exact
    /// entry has no category.
    pub weekday_template_id: Option<String>,
    pub days: Vec<PeriodDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodDay {
    pub date: NaiveDate,
    pub category_name: String,
    pub category_color: Option<String>,
    pub time: Option<String>,
    #[serde(default)]
    pub is_all_day: bool,
}

impl PeriodDay {
    /// Weekday normalized to Monday=0..Sunday=6.
    pub fn weekday_index(&self) -> u32 {
        self.date.weekday().num_days_from_monday()
    }
}

/// Resolved category for a single date.
#[derive(Debug, Clone, PartialEq)]
pub struct DayCategory {
    pub category: String,
    pub color: Option<String>,
    pub time: Option<String>,
    pub is_all_day: bool,
}

impl From<&PeriodDay> for DayCategory {
    fn from(day: &PeriodDay) -> Self {
        Self {
            category: day.category_name.clone(),
            color: day.category_color.clone(),
            time: day.time.clone(),
            is_all_day: day.is_all_day,
        }
    }
}

impl ProgramPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}
