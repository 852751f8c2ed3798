//! Flat substring search across loaded corpus sections.
//!
//! The walk is deterministic: sections in manifest order, object keys in
//! insertion order (serde_json's `preserve_order` feature), array elements by
//! index. Every leaf string is tested with case-insensitive substring
//! containment; there is no ranking beyond that, so callers wanting "top N"
//! truncate explicitly.

use serde::Serialize;
use serde_json::Value;

/// One matched leaf value.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// Which section the hit came from.
    #[serde(rename = "sectionId")]
    pub section_id: String,

    /// Dotted/indexed locator inside the section tree, e.g.
    /// `provinces.北京.报名时间` or `regions[2].name`.
    pub path: String,

    /// The object key the matched value sits under (for array elements, the
    /// nearest enclosing key).
    pub key: String,

    /// The matched leaf string, verbatim.
    pub value: String,

    /// Shallow best-effort summary of the enclosing object.
    pub context: Value,
}

/// Walk one section tree and collect every hit for `query`.
pub fn search_section(section_id: &str, root: &Value, query: &str) -> Vec<SearchHit> {
    let needle = query.to_lowercase();
    let mut hits = Vec::new();
    walk(section_id, root, "", "", None, &needle, &mut hits);
    hits
}

fn walk(
    section_id: &str,
    value: &Value,
    path: &str,
    key_hint: &str,
    enclosing: Option<&serde_json::Map<String, Value>>,
    needle: &str,
    hits: &mut Vec<SearchHit>,
) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                match child {
                    Value::String(s) => {
                        if s.to_lowercase().contains(needle) {
                            hits.push(SearchHit {
                                section_id: section_id.to_string(),
                                path: child_path,
                                key: key.clone(),
                                value: s.clone(),
                                context: extract_context(map),
                            });
                        }
                    }
                    Value::Object(_) | Value::Array(_) => {
                        walk(section_id, child, &child_path, key, Some(map), needle, hits);
                    }
                    _ => {}
                }
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let child_path = format!("{path}[{index}]");
                match item {
                    Value::String(s) => {
                        if s.to_lowercase().contains(needle) {
                            hits.push(SearchHit {
                                section_id: section_id.to_string(),
                                path: child_path,
                                key: key_hint.to_string(),
                                value: s.clone(),
                                context: enclosing
                                    .map(extract_context)
                                    .unwrap_or(Value::Null),
                            });
                        }
                    }
                    Value::Object(_) | Value::Array(_) => {
                        walk(
                            section_id, item, &child_path, key_hint, enclosing, needle, hits,
                        );
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

/// Pick the human-identifying fields of an object; fall back to the whole
/// object when none are present.
fn extract_context(map: &serde_json::Map<String, Value>) -> Value {
    let mut context = serde_json::Map::new();
    for field in ["title", "content", "name", "description"] {
        if let Some(v) = map.get(field) {
            context.insert(field.to_string(), v.clone());
        }
    }
    if context.is_empty() {
        Value::Object(map.clone())
    } else {
        Value::Object(context)
    }
}
