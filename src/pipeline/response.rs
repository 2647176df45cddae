//! Helpers for model responses that should contain JSON.

/// Strip a surrounding markdown code fence from a model response.
///
/// Keeps the segment between the first and second fence and drops a
/// leading `json` language tag. Responses without a fence are only trimmed.
pub fn clean_json_response(text: &str) -> &str {
    let text = text.trim();

    if !text.starts_with("```") {
        return text;
    }

    let inner = text.split("```").nth(1).unwrap_or("");
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim()
}

/// First `max_chars` characters of `text`, for log messages.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
