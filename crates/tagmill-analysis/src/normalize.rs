//! Response normalization.
//!
//! Model output is expected to be a JSON object but routinely arrives
//! wrapped in code fences, surrounded by prose, or slightly malformed
//! (trailing commas, unquoted keys). Normalization tries progressively
//! harder parses and coerces whatever survives into the fixed
//! [`AnalysisResult`] shape.
//!
//! Parse ladder:
//! 1. strip code fences, parse as-is
//! 2. extract the first `{...}` span and parse that
//! 3. sanitize (trailing commas, bare keys) and parse once more
//!
//! When all three fail, the caller degrades to the empty result; nothing
//! here panics on arbitrary input.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::debug;

use tagmill_core::{AnalysisResult, Error, Result};

static OBJECT_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());
static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([}\]])").unwrap());
static BARE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:"#).unwrap());

/// Normalize raw model output into an [`AnalysisResult`].
///
/// Fails with [`Error::MalformedOutput`] only when every parse attempt is
/// exhausted; callers convert that into the degraded empty result.
pub fn normalize(raw: &str) -> Result<AnalysisResult> {
    let stripped = strip_code_fences(raw);

    if let Ok(value) = serde_json::from_str::<JsonValue>(stripped) {
        return Ok(coerce(value));
    }

    // The object is often embedded in prose; pull out the widest span.
    if let Some(span) = OBJECT_SPAN.find(stripped) {
        if let Ok(value) = serde_json::from_str::<JsonValue>(span.as_str()) {
            debug!(
                subsystem = "analysis",
                component = "normalize",
                "Parsed model output after span extraction"
            );
            return Ok(coerce(value));
        }

        let sanitized = sanitize(span.as_str());
        if let Ok(value) = serde_json::from_str::<JsonValue>(&sanitized) {
            debug!(
                subsystem = "analysis",
                component = "normalize",
                "Parsed model output after sanitization"
            );
            return Ok(coerce(value));
        }
    }

    Err(Error::MalformedOutput(format!(
        "Not parseable as JSON after salvage: {}",
        snippet(raw)
    )))
}

/// Strip leading/trailing code-fence markers (```json ... ```).
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Repair the two malformations small models actually produce: trailing
/// commas and unquoted property names.
fn sanitize(text: &str) -> String {
    let no_trailing = TRAILING_COMMA.replace_all(text, "$1");
    BARE_KEY.replace_all(&no_trailing, "$1\"$2\":").to_string()
}

/// Coerce an arbitrary JSON value into the fixed result shape. Absent or
/// mistyped fields become their defaults rather than errors.
fn coerce(value: JsonValue) -> AnalysisResult {
    let JsonValue::Object(map) = value else {
        return AnalysisResult::degraded();
    };

    AnalysisResult {
        title: string_field(&map, "title"),
        correspondent: string_field(&map, "correspondent"),
        tags: map
            .get("tags")
            .and_then(JsonValue::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(JsonValue::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        document_type: string_field(&map, "document_type"),
        document_date: string_field(&map, "document_date"),
        language: string_field(&map, "language"),
        custom_fields: map
            .get("custom_fields")
            .and_then(JsonValue::as_object)
            .cloned(),
    }
}

fn string_field(map: &serde_json::Map<String, JsonValue>, key: &str) -> Option<String> {
    map.get(key).and_then(JsonValue::as_str).map(str::to_string)
}

fn snippet(raw: &str) -> String {
    let mut s: String = raw.chars().take(120).collect();
    if raw.chars().count() > 120 {
        s.push_str("...");
    }
    s
}
