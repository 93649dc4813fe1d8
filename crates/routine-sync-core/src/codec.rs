//! Decoding of string-encoded records written by the companion app.
//!
//! Records are JSON, but some app versions stored them Base64-encoded, and
//! list-valued preferences may be packed into one string behind a marker.
//!
//! ```text
//! {"id":"r1",...}                      plain JSON record
//! eyJpZCI6InIxIn0=                     Base64 of a JSON record
//! VGhpcyBpcyB0aGUgcHJlZml4IGZvciBhIGxpc3Qu!["a","b"]   encoded string list
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};

/// Marker the app puts in front of a string-encoded list.
/// It is the Base64 text of "This is the prefix for a list."
pub const LIST_MARKER: &str = "VGhpcyBpcyB0aGUgcHJlZml4IGZvciBhIGxpc3Qu";

/// Decode one record: direct JSON first, then Base64 when the text looks
/// like Base64. Returns `None` when neither works.
pub fn decode_record(raw: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => Some(value),
        Err(direct_err) => {
            if !looks_like_base64(raw) {
                tracing::debug!(error = %direct_err, "record is neither JSON nor Base64");
                return None;
            }
            let bytes = match STANDARD.decode(raw) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::debug!(error = %e, "Base64 decode failed");
                    return None;
                }
            };
            let text = String::from_utf8(bytes).ok()?;
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!(error = %e, "Base64 payload is not JSON");
                    None
                }
            }
        }
    }
}

/// Like [`decode_record`], restricted to JSON objects.
pub fn decode_object(raw: &str) -> Option<Map<String, Value>> {
    match decode_record(raw)? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// `^[A-Za-z0-9+/]*={0,2}$` with a length that is a multiple of four.
fn looks_like_base64(raw: &str) -> bool {
    if raw.len() % 4 != 0 {
        return false;
    }
    let body = raw.trim_end_matches('=');
    if raw.len() - body.len() > 2 {
        return false;
    }
    body.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}

/// Decode a string-encoded list: marker, optional `!`, then a JSON array.
/// Without the marker the text must be a plain JSON array.
///
/// Elements that are not strings are kept as their JSON text.
pub fn decode_string_list(raw: &str) -> Option<Vec<String>> {
    let payload = match raw.strip_prefix(LIST_MARKER) {
        Some(rest) => rest.strip_prefix('!').unwrap_or(rest),
        None => raw,
    };
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Array(items)) => Some(
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
        ),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "string list payload is not a JSON array");
            None
        }
    }
}

/// Encode a list the way the app writes it back.
pub fn encode_string_list(items: &[String]) -> String {
    let array = Value::Array(items.iter().cloned().map(Value::String).collect());
    format!("{LIST_MARKER}!{array}")
}
