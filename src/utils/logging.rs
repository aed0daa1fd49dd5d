use env_logger::{Builder, Target};
use log::{Level, LevelFilter, SetLoggerError};
use std::env;
use std::io::Write;

pub fn init_logging() -> Result<(), SetLoggerError> {
    let env = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let log_level = match env.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    let mut builder = Builder::from_default_env();

    builder.format(|buf, record| {
        let timestamp = buf.timestamp();
        let target = record.target();
        match record.level() {
            Level::Info => {
                writeln!(buf, "{} [INFO] [{}]: {}", timestamp, target, record.args())
            }
            level => {
                let file = record.file().unwrap_or("unknown");
                let line = record.line().unwrap_or(0);
                writeln!(
                    buf,
                    "{} [{}] [{}:{}] {}: {}",
                    timestamp,
                    level.as_str().to_uppercase(),
                    file,
                    line,
                    target,
                    record.args()
                )
            }
        }
    });

    // Filter out noisy modules in production
    if env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()) == "production" {
        builder.filter_module("tokio", LevelFilter::Info);
        builder.filter_module("sqlx", LevelFilter::Warn);
    }

    builder.filter_level(log_level).target(Target::Stdout).init();
    Ok(())
}

pub fn log_error_with_context(error: &anyhow::Error, context: &str) {
    log::error!("[{}] {}", context, error);

    // Log chain of causes for better debugging
    let mut source = error.source();
    while let Some(err) = source {
        log::error!("  Caused by: {}", err);
        source = err.source();
    }
}

pub fn log_window_fetch(events: usize, records: usize, duration_ms: u64) {
    log::info!(
        "[Window] Fetched {} events and {} workout records in {}ms",
        events,
        records,
        duration_ms
    );
}

pub fn log_assignment(event_id: &str, client_id: &str, workout_id: &str) {
    log::info!(
        "[Assignment] Linked event '{}' to client '{}' via workout '{}'",
        event_id,
        client_id,
        workout_id
    );
}

pub fn log_store_operation(operation: &str, table: &str, duration_ms: u64) {
    log::debug!("[Store] {} on {} took {}ms", operation, table, duration_ms);
}
