//! Defensive media URL extraction from completion payloads.
//!
//! The same provider can move its media URL between versions, so each
//! adapter declares an ordered list of known JSON paths. Paths are tried
//! in sequence and only http(s) URLs are accepted.

use serde_json::Value;

/// Walk a dotted path through a JSON value. Numeric segments index
/// into arrays.
fn walk<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = payload;
    for segment in path.split('.') {
        current = match segment.parse::<usize>() {
            Ok(index) => current.get(index)?,
            Err(_) => current.get(segment)?,
        };
    }
    Some(current)
}

/// Try each path in order; the first value that is an http(s) URL wins.
pub fn extract_media_url(payload: &Value, paths: &[&str]) -> Option<String> {
    for path in paths {
        if let Some(value) = walk(payload, path) {
            if let Some(url) = value.as_str() {
                if url.starts_with("http://") || url.starts_with("https://") {
                    return Some(url.to_string());
                }
            }
        }
    }
    None
}
