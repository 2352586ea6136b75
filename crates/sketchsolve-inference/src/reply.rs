//! Normalization of free-text model replies into [`ResultEntry`] lists.
//!
//! The prompt asks for a bare JSON list, but real replies come back in
//! several shapes: fenced in ```json blocks, as a single object instead of a
//! list, with fields of the wrong type, or as plain prose. Everything here
//! is total: any reply becomes a non-surprising `Vec<ResultEntry>`, with the
//! verbatim text preserved when nothing else works.

use tracing::debug;

use sketchsolve_core::protocol::ResultEntry;

/// Strip a surrounding markdown code fence, tolerating an info string like
/// `json` after the opening backticks. Text without a fence passes through
/// trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // The info string runs to the first newline; a fence with no newline at
    // all is not worth unwrapping.
    let Some((_, body)) = rest.split_once('\n') else {
        return trimmed;
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a model reply into entries.
///
/// Accepted shapes, in order: a JSON list of objects, a single JSON object
/// (wrapped into a one-element list). Anything else, including prose and
/// lists with non-object elements, yields one synthetic entry with the
/// reply text verbatim as its `result`.
pub fn parse_model_reply(text: &str) -> Vec<ResultEntry> {
    let clean = strip_code_fences(text);

    let parsed: serde_json::Value = match serde_json::from_str(clean) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Model reply is not JSON, passing it through verbatim");
            return vec![ResultEntry::unparsed(text)];
        }
    };

    let items = match parsed {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(_) => vec![parsed],
        _ => {
            debug!("Model reply is JSON but neither a list nor an object");
            return vec![ResultEntry::unparsed(text)];
        }
    };

    let mut entries = Vec::with_capacity(items.len());
    for item in &items {
        match coerce_entry(item) {
            Some(entry) => entries.push(entry),
            None => {
                debug!("Model reply list contains a non-object element");
                return vec![ResultEntry::unparsed(text)];
            }
        }
    }
    entries
}

/// Coerce one JSON object into an entry. Missing `expr` becomes empty, a
/// non-string `expr` is stringified, missing `assign` defaults to false, and
/// `result` passes through untouched.
fn coerce_entry(value: &serde_json::Value) -> Option<ResultEntry> {
    let obj = value.as_object()?;
    let expr = match obj.get("expr") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    let result = obj.get("result").cloned().unwrap_or(serde_json::Value::Null);
    let assign = obj.get("assign").and_then(|v| v.as_bool()).unwrap_or(false);
    Some(ResultEntry {
        expr,
        result,
        assign,
    })
}
