// CoachSync Library
// Reconciliation core for coaching schedules: correlates externally-owned
// calendar events with internally-owned workout records through a thin
// metadata channel.

pub mod assignment;
pub mod calendar;
pub mod config;
pub mod correlate;
pub mod database;
pub mod error;
pub mod matching;
pub mod models;
pub mod periods;
pub mod timegrid;
pub mod utils;
pub mod window;

// Re-export commonly used types
pub use assignment::AssignmentService;
pub use calendar::{CalendarClient, EventUpdateRequest, EventWriter};
pub use correlate::{ClientLens, Correlator};
pub use database::Database;
pub use error::{AppError, AppResult};
pub use models::*;
pub use timegrid::{Slot, TimeGrid, DEFAULT_TIMEZONE};
pub use window::{WindowData, WindowFetcher, WindowRequest};

use std::sync::Arc;

/// Application state shared across the engine's services.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub calendar: Arc<dyn CalendarClient>,
    pub grid: TimeGrid,
    pub shutdown: tokio_util::sync::CancellationToken,
}
