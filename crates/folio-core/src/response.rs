//! Model response parsing
//!
//! Model completions are expected to hold one JSON object, but in practice
//! arrive wrapped in Markdown fences or surrounded by prose. Parsing trims,
//! strips a full code fence, falls back to the outermost JSON slice, then
//! deserializes into the stage schema (whose optional keys
//! carry serde defaults).

use crate::error::ResponseError;
use serde::de::DeserializeOwned;
use serde_json::Value;

const FENCE: &str = "```";

/// Strip a surrounding Markdown code fence (```` ```json ... ``` ```` or
/// ```` ``` ... ``` ````) and outer whitespace.
///
/// Text that is not fully fenced is returned trimmed but otherwise intact.
#[must_use]
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed
        .strip_prefix(FENCE)
        .and_then(|rest| rest.strip_suffix(FENCE))
    else {
        return trimmed;
    };

    let inner = if let Some(after_tag) = inner
        .strip_prefix("json")
        .or_else(|| inner.strip_prefix("JSON"))
    {
        after_tag
    } else {
        match inner.split_once('\n') {
            Some((tag, body)) if tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) => body,
            _ => inner,
        }
    };

    inner.trim()
}

/// Outermost `{...}` or `[...]` slice of `text`
fn embedded_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closing = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closing)?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a raw completion into a stage schema
///
/// # Errors
/// - `ResponseError::Empty` when nothing is left after stripping
/// - `ResponseError::Malformed` when no JSON can be recovered
/// - `ResponseError::Schema` when the JSON does not fit `T`
pub fn parse_response<T: DeserializeOwned>(raw: &str) -> Result<T, ResponseError> {
    let text = strip_code_fence(raw);
    if text.is_empty() {
        return Err(ResponseError::Empty);
    }

    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(first) => embedded_json(text)
            .and_then(|slice| serde_json::from_str::<Value>(slice).ok())
            .ok_or_else(|| ResponseError::Malformed {
                reason: first.to_string(),
            })?,
    };

    serde_json::from_value(value).map_err(|e| ResponseError::Schema {
        reason: e.to_string(),
    })
}
