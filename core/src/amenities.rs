//! Amenity tag normalization.
//!
//! The backend stores amenities as a JSON array but some rows carry the array
//! serialized into a string. Readers always get a tag set; anything that is
//! not an array of strings collapses to the empty set.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// A listing's amenity tags.
pub type Amenities = BTreeSet<String>;

/// Parse a JSON-encoded amenity array such as `["wifi","pool"]`.
///
/// Invalid JSON or a non-array document yields the empty set.
pub fn parse_amenities(raw: &str) -> Amenities {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => collect_tags(items),
        Ok(other) => {
            warn!(shape = %kind(&other), "amenities string is not an array");
            Amenities::new()
        }
        Err(e) => {
            warn!(error = %e, "amenities string is not valid JSON");
            Amenities::new()
        }
    }
}

/// Normalize whatever the backend sent in the `amenities` field.
pub fn normalize_amenities(value: Value) -> Amenities {
    match value {
        Value::Array(items) => collect_tags(items),
        Value::String(raw) => parse_amenities(&raw),
        Value::Null => Amenities::new(),
        other => {
            warn!(shape = %kind(&other), "unexpected amenities shape");
            Amenities::new()
        }
    }
}

/// `#[serde(deserialize_with)]` adapter for [`normalize_amenities`].
pub fn deserialize<'de, D>(deserializer: D) -> Result<Amenities, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(normalize_amenities(Value::deserialize(deserializer)?))
}

/// Human-readable label for an amenity tag.
///
/// `wifi` is special-cased to `Wi-Fi`; otherwise underscores become spaces
/// and every word is capitalized.
pub fn format_amenity_label(tag: &str) -> String {
    if tag.eq_ignore_ascii_case("wifi") {
        return "Wi-Fi".to_string();
    }
    tag.replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let mut label: String = first.to_uppercase().collect();
                    label.push_str(&chars.as_str().to_lowercase());
                    label
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn collect_tags(items: Vec<Value>) -> Amenities {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(tag) if !tag.is_empty() => Some(tag),
            _ => None,
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
