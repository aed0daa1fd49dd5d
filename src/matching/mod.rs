// Event classification and identity extraction. Everything here is read
// path: malformed or missing metadata degrades to "no match", it never
// errors, so one bad event cannot break a whole window's view.

pub mod classify;
pub mod identity;

pub use classify::{
    classify_session, default_category_for, is_all_day_event, is_class_session,
    is_coaching_session, is_valid_session_event, should_exclude_event, SessionKind,
};
pub use identity::{
    extract_category, extract_client_id, has_linked_workout, linked_workout_id,
    CATEGORY_PROP_KEY, CLIENT_PROP_KEY, OWNED_PROP_KEYS, WORKOUT_PROP_KEY,
};
