use lazy_static::lazy_static;
use regex::Regex;

use crate::models::CalendarEvent;

/// Side-channel keys owned by this engine. Unassignment clears these and
/// only these; everything else in the map belongs to other tools.
pub const CLIENT_PROP_KEY: &str = "coachsync_client_id";
pub const CATEGORY_PROP_KEY: &str = "coachsync_category";
pub const WORKOUT_PROP_KEY: &str = "coachsync_workout_id";

pub const OWNED_PROP_KEYS: [&str; 3] = [CLIENT_PROP_KEY, CATEGORY_PROP_KEY, WORKOUT_PROP_KEY];

/// Captured value meaning "explicitly no client".
const NONE_SENTINEL: &str = "none";

lazy_static! {
    // Legacy text channel: a bracketed key-value block embedded in the
    // event description, e.g. "[Metadata: client=c1, workoutId=w1]".
    static ref METADATA_CLIENT_RE: Regex =
        Regex::new(r"\[Metadata:[^\]]*client=([^,\s}\]]+)").unwrap();
    static ref LOOSE_CLIENT_RE: Regex = Regex::new(r"client=([^,\s\n]+)").unwrap();
    static ref WORKOUT_ID_RE: Regex = Regex::new(r"workoutId=([^,\s}\]]+)").unwrap();
    static ref CATEGORY_TOKEN_RE: Regex = Regex::new(r"category=([^,\s}\]]+)").unwrap();
    static ref CATEGORY_LINE_RE: Regex = Regex::new(r"Workout Category:\s*([^\n]+)").unwrap();
}

fn captured(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty() && v != NONE_SENTINEL)
}

fn present(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != NONE_SENTINEL)
}

/// Resolve the client identity attached to an event.
///
/// Priority: explicit pre-configured field, then the namespaced
/// side-channel property, then the metadata block in the description, then
/// a bare `client=` token anywhere in the text.
pub fn extract_client_id(event: &CalendarEvent) -> Option<String> {
    if let Some(client) = present(event.pre_configured_client.as_ref()) {
        return Some(client);
    }
    if let Some(client) = present(event.side_channel.get(CLIENT_PROP_KEY)) {
        return Some(client);
    }
    let description = event.description.as_deref()?;
    captured(&METADATA_CLIENT_RE, description).or_else(|| captured(&LOOSE_CLIENT_RE, description))
}

/// Workout id linked to an event: explicit field, side-channel property,
/// or the `workoutId=` metadata token.
pub fn linked_workout_id(event: &CalendarEvent) -> Option<String> {
    if let Some(id) = present(event.linked_workout_id.as_ref()) {
        return Some(id);
    }
    if let Some(id) = present(event.side_channel.get(WORKOUT_PROP_KEY)) {
        return Some(id);
    }
    captured(&WORKOUT_ID_RE, event.description.as_deref()?)
}

pub fn has_linked_workout(event: &CalendarEvent) -> bool {
    linked_workout_id(event).is_some()
}

/// Category carried on the event itself. Callers that hold the client's
/// periods layer the period-derived category and type defaults on top.
pub fn extract_category(event: &CalendarEvent) -> Option<String> {
    if let Some(category) = present(event.pre_configured_category.as_ref()) {
        return Some(category);
    }
    if let Some(category) = present(event.side_channel.get(CATEGORY_PROP_KEY)) {
        return Some(category);
    }
    let description = event.description.as_deref()?;
    captured(&CATEGORY_LINE_RE, description).or_else(|| captured(&CATEGORY_TOKEN_RE, description))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn event_with_description(description: &str) -> CalendarEvent {
        CalendarEvent {
            id: "evt-1".to_string(),
            summary: "Training".to_string(),
            description: Some(description.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_pre_configured_client_wins() {
        let mut event = event_with_description("[Metadata: client=other]");
        event.pre_configured_client = Some("client-a".to_string());
        assert_eq!(extract_client_id(&event), Some("client-a".to_string()));
    }

    #[test]
    fn test_side_channel_beats_description() {
        let mut event = event_with_description("[Metadata: client=from-text]");
        event
            .side_channel
            .insert(CLIENT_PROP_KEY.to_string(), "from-props".to_string());
        assert_eq!(extract_client_id(&event), Some("from-props".to_string()));
    }

    #[test]
    fn test_metadata_block_pattern() {
        let event = event_with_description(
            "Morning session\n[Metadata: client=client-b, category=Strength, workoutId=w-9]",
        );
        assert_eq!(extract_client_id(&event), Some("client-b".to_string()));
        assert_eq!(linked_workout_id(&event), Some("w-9".to_string()));
    }

    #[test]
    fn test_loose_client_token_fallback() {
        let event = event_with_description("booked by client=client-c yesterday");
        assert_eq!(extract_client_id(&event), Some("client-c".to_string()));
    }

    #[test]
    fn test_none_sentinel_reads_as_absent() {
        let event = event_with_description("[Metadata: client=none]");
        assert_eq!(extract_client_id(&event), None);

        let mut event = CalendarEvent::default();
        event.pre_configured_client = Some("none".to_string());
        assert_eq!(extract_client_id(&event), None);
    }

    #[test]
    fn test_malformed_metadata_never_errors() {
        for text in [
            "[Metadata:",
            "[Metadata: ???]",
            "client=",
            "[Metadata: client=]",
            "",
        ] {
            let event = event_with_description(text);
            assert_eq!(extract_client_id(&event), None, "text: {:?}", text);
            assert_eq!(linked_workout_id(&event), None);
        }
    }

    #[test]
    fn test_category_extraction_order() {
        let event = event_with_description("Workout Category: Strength\n[Metadata: category=Conditioning]");
        assert_eq!(extract_category(&event), Some("Strength".to_string()));

        let event = event_with_description("[Metadata: client=c1, category=Conditioning]");
        assert_eq!(extract_category(&event), Some("Conditioning".to_string()));

        let mut event = event_with_description("nothing useful");
        event.side_channel = HashMap::from([(
            CATEGORY_PROP_KEY.to_string(),
            "Mobility".to_string(),
        )]);
        assert_eq!(extract_category(&event), Some("Mobility".to_string()));
    }
}
