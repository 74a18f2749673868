// core/src/discovery/extract.rs

//! Pulls an id list out of free-form oracle text.

use serde_json::Value;

/// Finds the first line holding a `[...]` token, parses that token as a JSON
/// array and keeps its integer elements.
///
/// Only the first bracketed line is considered. Anything unparseable yields an
/// empty list.
pub fn extract_ids(text: &str) -> Vec<i64> {
  let Some(line) = text.lines().find(|l| l.contains('[') && l.contains(']')) else {
    return Vec::new();
  };
  let Some(start) = line.find('[') else {
    return Vec::new();
  };
  let Some(len) = line[start..].find(']') else {
    return Vec::new();
  };
  let token = &line[start..=start + len];

  match serde_json::from_str::<Vec<Value>>(token) {
    Ok(values) => values.iter().filter_map(Value::as_i64).collect(),
    Err(_) => Vec::new(),
  }
}
