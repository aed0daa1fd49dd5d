// Text transforms for the description metadata channel. The bracketed
// block is the only structured channel the external source reliably
// round-trips, so edits must preserve whatever free text surrounds it.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref METADATA_BLOCK_RE: Regex = Regex::new(r"\[Metadata:[^\]]*\]").unwrap();
    static ref STRIP_BLOCK_RE: Regex = Regex::new(r"\n?\[Metadata:[^\]]*\]").unwrap();
    static ref CATEGORY_LINE_RE: Regex = Regex::new(r"(?m)^Workout Category:[^\n]*\n?").unwrap();
    static ref CATEGORY_LABEL_RE: Regex = Regex::new(r"(?m)^Workout Category:[^\n]*").unwrap();
    static ref CLIENT_TOKEN_RE: Regex = Regex::new(r"client=[^,\]]+").unwrap();
    static ref CATEGORY_TOKEN_RE: Regex = Regex::new(r"category=[^,\]]+").unwrap();
    static ref WORKOUT_TOKEN_RE: Regex = Regex::new(r"workoutId=[^,\]]+").unwrap();
    static ref PERIOD_TOKEN_RE: Regex = Regex::new(r"periodId=[^,\]]+").unwrap();
}

fn upsert_token(block: &str, re: &Regex, token: String) -> String {
    if re.is_match(block) {
        re.replace(block, token.as_str()).into_owned()
    } else if let Some(pos) = block.rfind(']') {
        format!("{}, {}{}", &block[..pos], token, &block[pos..])
    } else {
        block.to_string()
    }
}

/// Compose the description for an assigned event: keep the existing free
/// text, insert or update the metadata block, and maintain a leading
/// category label line on first assignment.
pub fn build_updated_description(
    existing: Option<&str>,
    client_id: &str,
    category: &str,
    workout_id: &str,
    period_id: &str,
) -> String {
    let existing = existing.unwrap_or("");

    if let Some(span) = METADATA_BLOCK_RE.find(existing) {
        // Update the existing block token by token; unknown tokens and the
        // surrounding text stay as they are.
        let mut block = existing[span.range()].to_string();
        block = upsert_token(&block, &CLIENT_TOKEN_RE, format!("client={}", client_id));
        block = upsert_token(&block, &CATEGORY_TOKEN_RE, format!("category={}", category));
        block = upsert_token(&block, &WORKOUT_TOKEN_RE, format!("workoutId={}", workout_id));
        block = upsert_token(&block, &PERIOD_TOKEN_RE, format!("periodId={}", period_id));

        let mut updated = String::with_capacity(existing.len() + block.len());
        updated.push_str(&existing[..span.start()]);
        updated.push_str(&block);
        updated.push_str(&existing[span.end()..]);
        return refresh_label(&updated, category);
    }

    let block = format!(
        "[Metadata: client={}, category={}, workoutId={}, periodId={}]",
        client_id, category, workout_id, period_id
    );

    let description = if CATEGORY_LABEL_RE.is_match(existing) {
        refresh_label(existing, category)
    } else {
        format!("Workout Category: {}\n{}", category, existing)
    };
    format!("{}\n{}", description.trim(), block)
}

/// An existing label line tracks the current category.
fn refresh_label(text: &str, category: &str) -> String {
    if CATEGORY_LABEL_RE.is_match(text) {
        CATEGORY_LABEL_RE
            .replace(text, format!("Workout Category: {}", category).as_str())
            .into_owned()
    } else {
        text.to_string()
    }
}

/// Inverse transform: remove the metadata block and the category label
/// line, leaving the rest of the free text (possibly nothing).
pub fn strip_assignment(description: &str) -> String {
    let cleaned = STRIP_BLOCK_RE.replace_all(description, "");
    let cleaned = CATEGORY_LINE_RE.replace_all(&cleaned, "");
    cleaned.trim().to_string()
}
