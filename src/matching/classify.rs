use crate::models::{CalendarEvent, CalendarSyncConfig};

use super::identity::extract_client_id;

// Defaults only apply where the user hasn't configured anything; the
// normalized sync config layers custom keywords on top.
pub const DEFAULT_COACHING_KEYWORDS: &[&str] =
    &["personal training", "pt", "training session", "workout"];

pub const DEFAULT_CLASS_KEYWORDS: &[&str] = &[
    "class",
    "group class",
    "group training",
    "group session",
    "total",
    "choice",
];

pub const DEFAULT_EXCLUSION_KEYWORDS: &[&str] = &["hold", "blocked", "meeting", "admin"];

const ALL_DAY_MINUTES: i64 = 12 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Coaching,
    Class,
    Personal,
}

/// All-day heuristic: a date-only start, a zero-length timed event (a
/// degenerate shape some sources produce), or anything spanning 12 hours
/// or more is treated as all-day for display purposes.
pub fn is_all_day_event(event: &CalendarEvent) -> bool {
    if event.start.date.is_some() && event.start.date_time.is_none() {
        return true;
    }
    if let (Some(start), Some(end)) = (
        event.start.date_time,
        event.end.as_ref().and_then(|e| e.date_time),
    ) {
        if start == end {
            return true;
        }
        if (end - start).num_minutes() >= ALL_DAY_MINUTES {
            return true;
        }
    }
    false
}

fn title_contains_any(title: &str, keywords: &[String], defaults: &[&str]) -> bool {
    let lower = title.to_lowercase();
    keywords
        .iter()
        .map(|k| k.to_lowercase())
        .chain(defaults.iter().map(|k| k.to_string()))
        .any(|keyword| !keyword.is_empty() && lower.contains(&keyword))
}

pub fn is_coaching_session(title: &str, configured: &[String]) -> bool {
    title_contains_any(title, configured, DEFAULT_COACHING_KEYWORDS)
}

pub fn is_class_session(title: &str, configured: &[String]) -> bool {
    title_contains_any(title, configured, DEFAULT_CLASS_KEYWORDS)
}

/// Holds, admin blocks and the like. Configured keywords replace the
/// defaults entirely here, unlike the session keywords which combine.
pub fn should_exclude_event(title: &str, configured: &[String]) -> bool {
    let lower = title.to_lowercase();
    if configured.is_empty() {
        return DEFAULT_EXCLUSION_KEYWORDS
            .iter()
            .any(|keyword| lower.contains(keyword));
    }
    configured
        .iter()
        .any(|keyword| lower.contains(&keyword.to_lowercase()))
}

pub fn classify_session(event: &CalendarEvent, config: &CalendarSyncConfig) -> SessionKind {
    if event.is_class_session || is_class_session(&event.summary, &config.class_keywords) {
        return SessionKind::Class;
    }
    if event.is_coaching_session
        || is_coaching_session(&event.summary, &config.coaching_keywords)
        || extract_client_id(event).is_some()
    {
        return SessionKind::Coaching;
    }
    SessionKind::Personal
}

/// Type-based category default, used when neither the event nor the
/// client's period carries one.
pub fn default_category_for(kind: SessionKind) -> Option<&'static str> {
    match kind {
        SessionKind::Class => Some("Class"),
        SessionKind::Coaching => Some("General"),
        SessionKind::Personal => None,
    }
}

/// A session event is worth correlating when it isn't excluded, and — for
/// coaching sessions — when a client identity can actually be resolved.
/// Class sessions are always valid: the coach teaches them whether or not
/// individual clients are listed.
pub fn is_valid_session_event(event: &CalendarEvent, config: &CalendarSyncConfig) -> bool {
    if should_exclude_event(&event.summary, &config.exclusion_keywords) {
        return false;
    }
    if event.is_class_session || is_class_session(&event.summary, &config.class_keywords) {
        return true;
    }
    if event.is_coaching_session || is_coaching_session(&event.summary, &config.coaching_keywords) {
        return extract_client_id(event).is_some();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_sync_config;
    use crate::models::EventTime;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn timed_event(minutes: i64) -> CalendarEvent {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 18, 0, 0).unwrap();
        CalendarEvent {
            id: "evt".to_string(),
            summary: "PT with Devon".to_string(),
            start: EventTime::at(start),
            end: Some(EventTime::at(start + Duration::minutes(minutes))),
            ..Default::default()
        }
    }

    #[test]
    fn test_date_only_start_is_all_day() {
        let event = CalendarEvent {
            start: EventTime::on(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()),
            ..Default::default()
        };
        assert!(is_all_day_event(&event));
    }

    #[test]
    fn test_zero_length_event_is_all_day() {
        assert!(is_all_day_event(&timed_event(0)));
    }

    #[test]
    fn test_twelve_hour_boundary() {
        assert!(is_all_day_event(&timed_event(12 * 60)));
        assert!(!is_all_day_event(&timed_event(12 * 60 - 1)));
    }

    #[test]
    fn test_keyword_classification() {
        assert!(is_coaching_session("PT with Devon", &[]));
        assert!(is_class_session("6am Group Class", &[]));
        assert!(should_exclude_event("HOLD - admin time", &[]));

        // configured coaching keywords combine with defaults
        let configured = vec!["semi-private".to_string()];
        assert!(is_coaching_session("Semi-Private: Devon + Sam", &configured));
        assert!(is_coaching_session("workout block", &configured));

        // configured exclusions replace the defaults
        let exclusions = vec!["vacation".to_string()];
        assert!(should_exclude_event("Vacation day", &exclusions));
        assert!(!should_exclude_event("hold", &exclusions));
    }

    #[test]
    fn test_session_validity() {
        let config = default_sync_config();

        let class = CalendarEvent {
            summary: "Group Class".to_string(),
            ..Default::default()
        };
        assert!(is_valid_session_event(&class, &config));

        // coaching without any resolvable client is not actionable
        let coaching = CalendarEvent {
            summary: "Training Session".to_string(),
            ..Default::default()
        };
        assert!(!is_valid_session_event(&coaching, &config));

        let mut coaching = coaching;
        coaching.pre_configured_client = Some("client-1".to_string());
        assert!(is_valid_session_event(&coaching, &config));

        let hold = CalendarEvent {
            summary: "Hold for PT".to_string(),
            ..Default::default()
        };
        assert!(!is_valid_session_event(&hold, &config));
    }

    #[test]
    fn test_classify_session_kinds() {
        let config = default_sync_config();

        let class = CalendarEvent {
            summary: "Total Body Class".to_string(),
            ..Default::default()
        };
        assert_eq!(classify_session(&class, &config), SessionKind::Class);

        let mut coaching = CalendarEvent {
            summary: "Catch up".to_string(),
            ..Default::default()
        };
        coaching.pre_configured_client = Some("client-1".to_string());
        assert_eq!(classify_session(&coaching, &config), SessionKind::Coaching);

        let personal = CalendarEvent {
            summary: "Dentist".to_string(),
            ..Default::default()
        };
        assert_eq!(classify_session(&personal, &config), SessionKind::Personal);
        assert_eq!(default_category_for(SessionKind::Personal), None);
    }
}
