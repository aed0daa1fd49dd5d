// End-to-end schedule workflows against a temp store and an offline
// calendar source: window fetch, correlation, assignment, unassignment.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use coachsync::assignment::AssignmentService;
use coachsync::calendar::{CalendarClient, EventUpdateRequest};
use coachsync::config::{load_business_hours, save_business_hours};
use coachsync::correlate::{ClientLens, Correlator};
use coachsync::error::AppResult;
use coachsync::models::{
    BusinessHours, CalendarEvent, DayHours, EntryKind, EventTime, PeriodDay, ProgramPeriod,
};
use coachsync::timegrid::TimeGrid;
use coachsync::window::{WindowFetcher, WindowRequest};
use coachsync::Database;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::NamedTempFile;

const ACCOUNT: &str = "acct-1";

struct OfflineClient;

#[async_trait]
impl CalendarClient for OfflineClient {
    async fn list_events(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _calendar_id: &str,
    ) -> AppResult<Vec<CalendarEvent>> {
        Err(coachsync::error::AppError::calendar("offline"))
    }

    async fn update_event(&self, _request: EventUpdateRequest) -> AppResult<()> {
        Err(coachsync::error::AppError::calendar("offline"))
    }

    async fn is_connected(&self) -> AppResult<bool> {
        Ok(false)
    }
}

async fn create_test_database() -> Arc<Database> {
    let temp_file = NamedTempFile::new().unwrap();
    let (_, path) = temp_file.keep().unwrap();
    let db_path = format!("sqlite:{}", path.to_str().unwrap());

    Arc::new(Database::connect(&db_path).await.unwrap())
}

fn grid() -> TimeGrid {
    TimeGrid::new(chrono_tz::America::Los_Angeles)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn session(id: &str, date: NaiveDate, hour: u32) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        summary: "Training Session".to_string(),
        start: EventTime::at(grid().instant_at(date, hour, 0)),
        end: Some(EventTime::at(grid().instant_at(date, hour + 1, 0))),
        ..Default::default()
    }
}

fn march_periods() -> Vec<ProgramPeriod> {
    vec![ProgramPeriod {
        id: "p1".to_string(),
        client_id: "c1".to_string(),
        name: "Strength Block".to_string(),
        color: None,
        start_date: day(2024, 3, 1),
        end_date: day(2024, 3, 31),
        weekday_template_id: None,
        days: vec![PeriodDay {
            date: day(2024, 3, 4),
            category_name: "Strength".to_string(),
            category_color: None,
            time: Some("10:00".to_string()),
            is_all_day: false,
        }],
    }]
}

fn week_request() -> WindowRequest {
    WindowRequest {
        start: grid().instant_at(day(2024, 3, 3), 0, 0),
        end: grid().instant_at(day(2024, 3, 9), 23, 30),
        client_id: None,
    }
}

#[tokio::test(start_paused = true)]
async fn test_full_assignment_workflow() {
    let db = create_test_database().await;
    let client: Arc<dyn CalendarClient> = Arc::new(OfflineClient);

    // Seed the week: two sessions and the client's period
    let monday = session("e-mon", day(2024, 3, 4), 10);
    let wednesday = session("e-wed", day(2024, 3, 6), 7);
    db.upsert_event(ACCOUNT, &monday).await.unwrap();
    db.upsert_event(ACCOUNT, &wednesday).await.unwrap();
    for period in &march_periods() {
        db.upsert_period(ACCOUNT, period).await.unwrap();
    }

    let fetcher = WindowFetcher::new(db.clone(), client.clone(), grid(), ACCOUNT, "primary");
    let correlator = Correlator::new(grid());

    // 1. Before assignment: both events are unmatched
    let data = fetcher.fetch(week_request()).await.unwrap().unwrap();
    let entries = correlator.unify_window(&data.events, &data.records, &ClientLens::AllSessions);
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.kind == EntryKind::EventOnly));

    // 2. Assign the Monday session
    let service = AssignmentService::new(
        db.clone(),
        client.clone(),
        grid(),
        ACCOUNT,
        "primary",
    );
    let periods = db.periods_for_client(ACCOUNT, "c1").await.unwrap();
    let result = service.assign(&monday, "c1", &periods, None).await.unwrap();
    assert!(result.success);

    // 3. The next window shows the Monday session paired with its record
    let data = fetcher.fetch(week_request()).await.unwrap().unwrap();
    let entries = correlator.unify_window(&data.events, &data.records, &ClientLens::AllSessions);
    assert_eq!(entries.len(), 2);

    let paired = entries.iter().find(|e| e.kind == EntryKind::Paired).unwrap();
    assert_eq!(paired.event.as_ref().unwrap().id, "e-mon");
    let record = paired.record.as_ref().unwrap();
    assert_eq!(record.category_name, "Strength");
    assert_eq!(record.date, day(2024, 3, 4));

    // Under the client lens only the assigned session is visible
    let lens = ClientLens::Client("c1".to_string());
    let entries = correlator.unify_window(&data.events, &data.records, &lens);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, EntryKind::Paired);

    // 4. Unassign and verify the view returns to unmatched
    let result = service.unassign(&monday, true).await.unwrap();
    assert!(result.success);

    let data = fetcher.fetch(week_request()).await.unwrap().unwrap();
    let entries = correlator.unify_window(&data.events, &data.records, &ClientLens::AllSessions);
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.kind == EntryKind::EventOnly));
    assert!(data.records.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_record_only_entries_stay_visible() {
    let db = create_test_database().await;
    let client: Arc<dyn CalendarClient> = Arc::new(OfflineClient);

    // A workout scheduled directly (no calendar event), untimed
    let mut record =
        coachsync::models::WorkoutRecord::new("c1", "p1", day(2024, 3, 5), "Conditioning");
    record.title = "Tempo run".to_string();
    db.create_workout(ACCOUNT, &record).await.unwrap();

    let fetcher = WindowFetcher::new(db.clone(), client, grid(), ACCOUNT, "primary");
    let data = fetcher.fetch(week_request()).await.unwrap().unwrap();

    let correlator = Correlator::new(grid());
    let entries = correlator.unify_window(&data.events, &data.records, &ClientLens::AllSessions);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, EntryKind::RecordOnly);
    // Untimed records land on the late-day placeholder instant
    assert_eq!(
        entries[0].sort_instant,
        grid().instant_at(day(2024, 3, 5), 18, 0)
    );
}

#[tokio::test]
async fn test_business_hours_drive_the_slot_grid() {
    let db = create_test_database().await;

    let hours = BusinessHours {
        days_of_week: vec![1, 2, 3, 4, 5],
        day_hours: HashMap::from([(1, DayHours { start_hour: 9, end_hour: 17 })]),
    };
    save_business_hours(&db, ACCOUNT, &hours).await.unwrap();

    let loaded = load_business_hours(&db, ACCOUNT).await.unwrap();
    let slots = grid().slots_for_business_hours(loaded.as_ref());

    assert_eq!(slots.len(), 16);
    assert_eq!(slots.first().unwrap().label(), "09:00");
    assert_eq!(slots.last().unwrap().label(), "16:30");

    // Slot placement for a 10:00 session: full-hour slot only
    let ten = slots.iter().find(|s| s.label() == "10:00").unwrap();
    let ten_thirty = slots.iter().find(|s| s.label() == "10:30").unwrap();
    assert!(ten.matches(10, 0));
    assert!(!ten_thirty.matches(10, 0));
}
