// Declare modules
pub mod config;
pub mod event;
pub mod period;
pub mod schedule;
pub mod workout;

// Re-export all public types so callers can keep flat imports
// like `use coachsync::CalendarEvent`.
pub use config::{BusinessHours, CalendarSyncConfig, DayHours, LocationAbbreviation};
pub use event::{CalendarEvent, EventTime, EventUpdates};
pub use period::{DayCategory, PeriodDay, ProgramPeriod, UNSCHEDULED_PERIOD_ID};
pub use schedule::{
    AssignmentResult, BulkAssignmentResult, EntryKind, UnassignResult, UnifiedEntry,
};
pub use workout::WorkoutRecord;
