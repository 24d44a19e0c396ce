//! Forgiving deserializers for model-produced JSON.
//!
//! The reasoning gateway is asked for structured output but routinely returns
//! near-misses: a string where a list was requested, an object where a
//! sentence was expected, `"85%"` instead of `85`. These helpers coerce such
//! shapes into the typed model so a single odd field does not discard an
//! otherwise usable response. Structurally wrong output (missing required
//! fields, wrong top-level type) still fails and triggers the phase fallback.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::ConfidenceLevel;

/// Keys consulted, in order, when an object must be rendered as one line.
const TEXT_KEYS: &[&str] = &["description", "text", "summary", "name", "title", "finding"];

pub(crate) fn value_to_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(map) => TEXT_KEYS
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| v.to_string()),
        other => other.to_string(),
    }
}

pub(crate) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(value_to_text(&v))
}

pub(crate) fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = Value::deserialize(d)?;
    let s = match &v {
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => value_to_text(other),
    };
    Ok(if s.is_empty() { None } else { Some(s) })
}

pub(crate) fn text_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) if s.trim().is_empty() => Vec::new(),
        other => vec![value_to_text(&other)],
    })
}

pub(crate) fn value_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Value>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    })
}

/// Confidence that never fails: unknown labels degrade to `low`.
pub(crate) fn confidence<'de, D: Deserializer<'de>>(d: D) -> Result<ConfidenceLevel, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(serde_json::from_value(v).unwrap_or(ConfidenceLevel::Low))
}

pub(crate) fn opt_confidence<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<ConfidenceLevel>, D::Error> {
    let v = Value::deserialize(d)?;
    if v.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(v).unwrap_or(ConfidenceLevel::Low)))
}

/// A number, or a string such as `"85%"` / `"7/10"`; anything else is `0.0`.
pub(crate) fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let head = s.split('/').next().unwrap_or("");
            head.trim().trim_end_matches('%').trim().parse::<f64>().unwrap_or(0.0)
        }
        Value::Object(map) => map
            .get("score")
            .or_else(|| map.get("value"))
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Tool parameters: an object is taken as-is, a bare string becomes
/// `{"query": s}`, anything else is an empty map.
pub(crate) fn params<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<serde_json::Map<String, Value>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Object(map) => map,
        Value::String(s) if !s.is_empty() => {
            let mut map = serde_json::Map::new();
            map.insert("query".into(), Value::String(s));
            map
        }
        _ => serde_json::Map::new(),
    })
}

/// Action priority, `1` being most urgent. Accepts numbers and the labels
/// `high` / `medium` / `low`.
pub(crate) fn priority<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match &v {
        Value::Number(n) => n.as_u64().map(|n| n as u32).unwrap_or(DEFAULT_PRIORITY),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "critical" | "high" => 1,
            "medium" => 2,
            "low" => 3,
            other => other.parse().unwrap_or(DEFAULT_PRIORITY),
        },
        _ => DEFAULT_PRIORITY,
    })
}

pub(crate) const DEFAULT_PRIORITY: u32 = 5;

pub(crate) fn default_priority() -> u32 {
    DEFAULT_PRIORITY
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "text_list")]
        items: Vec<String>,
        #[serde(default, deserialize_with = "number")]
        score: f64,
        #[serde(default, deserialize_with = "confidence")]
        confidence: ConfidenceLevel,
    }

    #[test]
    fn single_string_becomes_one_item_list() {
        let p: Probe = serde_json::from_str(r#"{"items": "only one"}"#).unwrap();
        assert_eq!(p.items, vec!["only one".to_string()]);
    }

    #[test]
    fn objects_in_lists_render_their_description() {
        let p: Probe =
            serde_json::from_str(r#"{"items": [{"description": "gap A"}, "gap B"]}"#).unwrap();
        assert_eq!(p.items, vec!["gap A".to_string(), "gap B".to_string()]);
    }

    #[test]
    fn percent_strings_parse_as_numbers() {
        let p: Probe = serde_json::from_str(r#"{"score": "85%"}"#).unwrap();
        assert!((p.score - 85.0).abs() < f64::EPSILON);
        let p: Probe = serde_json::from_str(r#"{"score": "7/10"}"#).unwrap();
        assert!((p.score - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_confidence_degrades_to_low() {
        let p: Probe = serde_json::from_str(r#"{"confidence": "probable"}"#).unwrap();
        assert_eq!(p.confidence, ConfidenceLevel::Low);
    }
}
