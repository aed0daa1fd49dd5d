//! Configuration normalization.
//!
//! The small configuration documents (keyword lists, location
//! abbreviations, business hours) have accumulated several historical
//! shapes: comma-joined strings, bare lists, and a legacy keyed-object
//! form for abbreviations. Reads migrate whatever is found into one
//! canonical shape and write it back, so every later read is cheap and the
//! migration is idempotent.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::matching::classify::{
    DEFAULT_CLASS_KEYWORDS, DEFAULT_COACHING_KEYWORDS, DEFAULT_EXCLUSION_KEYWORDS,
};
use crate::models::{BusinessHours, CalendarSyncConfig, LocationAbbreviation};

const CONFIG_DOC_PREFIX: &str = "calendar-config";
const BUSINESS_HOURS_DOC_PREFIX: &str = "business-hours";

pub fn default_sync_config() -> CalendarSyncConfig {
    CalendarSyncConfig {
        selected_calendar_id: None,
        coaching_keywords: DEFAULT_COACHING_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        coaching_color: None,
        class_keywords: DEFAULT_CLASS_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        class_color: None,
        exclusion_keywords: DEFAULT_EXCLUSION_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        location_abbreviations: Vec::new(),
        last_sync_time: None,
    }
}

fn config_doc_id(account_id: &str) -> String {
    format!("{}-{}", CONFIG_DOC_PREFIX, account_id)
}

fn business_hours_doc_id(account_id: &str) -> String {
    format!("{}-{}", BUSINESS_HOURS_DOC_PREFIX, account_id)
}

/// Collapse internal whitespace so "Main  Street" and "Main Street" key
/// the same abbreviation entry.
fn normalize_location_key(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A keyword list may be stored as a proper list, a comma-joined string,
/// or be missing entirely.
pub fn normalize_keyword_list(value: Option<&Value>, fallback: &[String]) -> Vec<String> {
    let tokens: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(joined)) => joined
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => return fallback.to_vec(),
    };
    if tokens.is_empty() {
        return fallback.to_vec();
    }
    let mut seen = std::collections::HashSet::new();
    tokens
        .into_iter()
        .filter(|token| seen.insert(token.to_lowercase()))
        .collect()
}

fn string_field<'a>(entry: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| entry.get(*key).and_then(Value::as_str))
}

/// The explicit flag wins; otherwise a legacy "n/a"/"na" abbreviation
/// marks the entry ignored.
fn infer_ignored(explicit: Option<&Value>, abbreviation: &str) -> Option<bool> {
    if let Some(Value::Bool(flag)) = explicit {
        return Some(*flag);
    }
    match abbreviation.trim().to_lowercase().as_str() {
        "n/a" | "na" => Some(true),
        _ => None,
    }
}

fn abbreviation_entry(original: &str, abbreviation: &str, explicit: Option<&Value>) -> Option<LocationAbbreviation> {
    let original = normalize_location_key(original);
    if original.is_empty() {
        return None;
    }
    let abbreviation = {
        let trimmed = abbreviation.trim();
        if trimmed.is_empty() {
            original.clone()
        } else {
            trimmed.to_string()
        }
    };
    let ignored = infer_ignored(explicit, &abbreviation);
    Some(LocationAbbreviation {
        // Ignored entries keep displaying the original
        abbreviation: if ignored.unwrap_or(false) {
            original.clone()
        } else {
            abbreviation
        },
        original,
        ignored,
    })
}

/// Migrate whatever shape the abbreviation table is in — legacy keyed
/// object or current array — into the canonical record list, de-duplicated
/// by normalized original with later entries winning.
pub fn normalize_location_abbreviations(value: Option<&Value>) -> Vec<LocationAbbreviation> {
    let mut out: Vec<LocationAbbreviation> = Vec::new();

    match value {
        // Legacy: { [original]: "abbr" } or { [original]: { abbreviation, ignored } }
        Some(Value::Object(map)) => {
            for (original, entry) in map {
                let parsed = match entry {
                    Value::String(abbr) => abbreviation_entry(original, abbr, None),
                    Value::Object(_) => {
                        let abbr = string_field(entry, &["abbreviation", "abbr"]).unwrap_or("");
                        let explicit = entry.get("ignored").or_else(|| entry.get("isIgnored"));
                        abbreviation_entry(original, abbr, explicit)
                    }
                    _ => None,
                };
                if let Some(entry) = parsed {
                    out.push(entry);
                }
            }
        }
        // Current: array of entries
        Some(Value::Array(items)) => {
            for entry in items {
                if !entry.is_object() {
                    continue;
                }
                let Some(original) = string_field(entry, &["original", "location", "full", "name"])
                else {
                    continue;
                };
                let abbr = string_field(entry, &["abbreviation", "abbr"]).unwrap_or("");
                let explicit = entry.get("ignored").or_else(|| entry.get("isIgnored"));
                if let Some(entry) = abbreviation_entry(original, abbr, explicit) {
                    out.push(entry);
                }
            }
        }
        _ => {}
    }

    // De-dupe by normalized original, keep last write
    let mut by_key: Vec<(String, LocationAbbreviation)> = Vec::new();
    for entry in out {
        let key = normalize_location_key(&entry.original).to_lowercase();
        if let Some(existing) = by_key.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = entry;
        } else {
            by_key.push((key, entry));
        }
    }
    by_key.into_iter().map(|(_, entry)| entry).collect()
}

fn normalize_last_sync_time(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

fn raw_field<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| raw.get(*key))
}

/// Normalize a raw configuration document into the canonical shape.
/// Historical documents used camelCase keys; canonical documents use the
/// serde snake_case of `CalendarSyncConfig`. Both spellings are accepted.
pub fn normalize_sync_config(raw: &Value, defaults: &CalendarSyncConfig) -> CalendarSyncConfig {
    CalendarSyncConfig {
        selected_calendar_id: raw_field(raw, &["selected_calendar_id", "selectedCalendarId"])
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| defaults.selected_calendar_id.clone()),
        coaching_keywords: normalize_keyword_list(
            raw_field(raw, &["coaching_keywords", "coachingKeywords"]),
            &defaults.coaching_keywords,
        ),
        coaching_color: raw_field(raw, &["coaching_color", "coachingColor"])
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| defaults.coaching_color.clone()),
        class_keywords: normalize_keyword_list(
            raw_field(raw, &["class_keywords", "classKeywords"]),
            &defaults.class_keywords,
        ),
        class_color: raw_field(raw, &["class_color", "classColor"])
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| defaults.class_color.clone()),
        exclusion_keywords: normalize_keyword_list(
            raw_field(raw, &["exclusion_keywords", "exclusionKeywords"]),
            &defaults.exclusion_keywords,
        ),
        location_abbreviations: normalize_location_abbreviations(raw_field(
            raw,
            &["location_abbreviations", "locationAbbreviations"],
        )),
        last_sync_time: normalize_last_sync_time(raw_field(
            raw,
            &["last_sync_time", "lastSyncTime"],
        )),
    }
}

/// Read the sync configuration, migrating legacy shapes and seeding
/// defaults on first read. The canonical form is always written back.
pub async fn load_calendar_config(db: &Database, account_id: &str) -> AppResult<CalendarSyncConfig> {
    let doc_id = config_doc_id(account_id);
    let defaults = default_sync_config();

    let normalized = match db.get_config_doc(account_id, &doc_id).await? {
        Some(raw) => normalize_sync_config(&raw, &defaults),
        None => {
            log::info!("Seeding calendar config for account {}", account_id);
            defaults
        }
    };

    let canonical = serde_json::to_value(&normalized)
        .map_err(|e| AppError::config(format!("serializing calendar config: {}", e)))?;
    db.put_config_doc(account_id, &doc_id, &canonical).await?;

    Ok(normalized)
}

pub async fn save_calendar_config(
    db: &Database,
    account_id: &str,
    config: &CalendarSyncConfig,
) -> AppResult<()> {
    let canonical = serde_json::to_value(config)
        .map_err(|e| AppError::config(format!("serializing calendar config: {}", e)))?;
    db.put_config_doc(account_id, &config_doc_id(account_id), &canonical)
        .await
}

pub async fn load_business_hours(
    db: &Database,
    account_id: &str,
) -> AppResult<Option<BusinessHours>> {
    let doc = db
        .get_config_doc(account_id, &business_hours_doc_id(account_id))
        .await?;
    match doc {
        Some(raw) => match serde_json::from_value::<BusinessHours>(raw) {
            Ok(hours) => Ok(Some(hours)),
            Err(e) => {
                // A corrupt document degrades to defaults rather than
                // breaking every view that needs a grid.
                log::warn!("Ignoring malformed business hours for {}: {}", account_id, e);
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

pub async fn save_business_hours(
    db: &Database,
    account_id: &str,
    hours: &BusinessHours,
) -> AppResult<()> {
    let canonical = serde_json::to_value(hours)
        .map_err(|e| AppError::config(format!("serializing business hours: {}", e)))?;
    db.put_config_doc(account_id, &business_hours_doc_id(account_id), &canonical)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keyword_list_from_array() {
        let value = json!(["  PT ", "class", "", "pt"]);
        let out = normalize_keyword_list(Some(&value), &[]);
        // trimmed, empties dropped, case-insensitive de-dupe
        assert_eq!(out, vec!["PT".to_string(), "class".to_string()]);
    }

    #[test]
    fn test_keyword_list_from_comma_string() {
        let value = json!("hold, blocked ,admin,");
        let out = normalize_keyword_list(Some(&value), &[]);
        assert_eq!(out, vec!["hold", "blocked", "admin"]);
    }

    #[test]
    fn test_keyword_list_fallback() {
        let fallback = vec!["workout".to_string()];
        assert_eq!(normalize_keyword_list(None, &fallback), fallback);
        assert_eq!(normalize_keyword_list(Some(&json!(42)), &fallback), fallback);
        assert_eq!(normalize_keyword_list(Some(&json!([])), &fallback), fallback);
    }

    #[test]
    fn test_abbreviations_from_legacy_map() {
        let value = json!({
            "Main Street Studio": "MSS",
            "Riverside  Gym": { "abbr": "RG", "isIgnored": false },
        });
        let mut out = normalize_location_abbreviations(Some(&value));
        out.sort_by(|a, b| a.original.cmp(&b.original));

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].original, "Main Street Studio");
        assert_eq!(out[0].abbreviation, "MSS");
        assert_eq!(out[0].ignored, None);
        // whitespace collapsed in the key
        assert_eq!(out[1].original, "Riverside Gym");
        assert_eq!(out[1].abbreviation, "RG");
        assert_eq!(out[1].ignored, Some(false));
    }

    #[test]
    fn test_abbreviations_na_sentinel_infers_ignored() {
        let value = json!([
            { "original": "Park", "abbreviation": "n/a" },
            { "original": "Home Gym", "abbreviation": "NA" },
        ]);
        let out = normalize_location_abbreviations(Some(&value));
        for entry in &out {
            assert_eq!(entry.ignored, Some(true));
            // ignored entries display the original
            assert_eq!(entry.abbreviation, entry.original);
        }
    }

    #[test]
    fn test_abbreviations_later_entries_win() {
        let value = json!([
            { "original": "Main Street Studio", "abbreviation": "OLD" },
            { "original": "Main  Street  Studio", "abbreviation": "MSS" },
        ]);
        let out = normalize_location_abbreviations(Some(&value));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].abbreviation, "MSS");
    }

    #[test]
    fn test_normalize_sync_config_is_idempotent() {
        let defaults = default_sync_config();
        let legacy = json!({
            "selectedCalendarId": "primary",
            "coachingKeywords": "pt, training session",
            "classKeywords": ["class", "total"],
            "locationAbbreviations": { "Main Street Studio": "MSS" },
        });

        let first = normalize_sync_config(&legacy, &defaults);
        assert_eq!(first.selected_calendar_id.as_deref(), Some("primary"));
        assert_eq!(first.coaching_keywords, vec!["pt", "training session"]);
        assert_eq!(first.class_keywords, vec!["class", "total"]);
        assert_eq!(first.location_abbreviations.len(), 1);
        // untouched fields fall back to defaults
        assert_eq!(first.exclusion_keywords, defaults.exclusion_keywords);

        let canonical = serde_json::to_value(&first).unwrap();
        let second = normalize_sync_config(&canonical, &defaults);
        assert_eq!(second.coaching_keywords, first.coaching_keywords);
        assert_eq!(second.class_keywords, first.class_keywords);
        assert_eq!(
            second.location_abbreviations,
            first.location_abbreviations
        );
    }

    #[test]
    fn test_last_sync_time_shapes() {
        assert!(normalize_last_sync_time(Some(&json!("2024-03-04T10:00:00Z"))).is_some());
        assert!(normalize_last_sync_time(Some(&json!(1709546400))).is_some());
        assert!(normalize_last_sync_time(Some(&json!("not a date"))).is_none());
        assert!(normalize_last_sync_time(None).is_none());
    }
}
