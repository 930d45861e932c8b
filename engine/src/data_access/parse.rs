//! Tagged parsing of upstream payloads.
//!
//! The collaborator API is schema-variable: visit lists arrive as native
//! JSON arrays, JSON-encoded strings, or comma-separated strings; numeric ids
//! show up under different keys depending on which endpoint produced the
//! object. This module is the single place that absorbs that variability and
//! hands back canonical typed records (§9's "tagged parse step" design note).

use crate::models::{CafeId, Cafe, LikedMenu, Review};
use serde_json::Value;

/// Key preference used when extracting a café id from a visited-list entry,
/// per §4.1.
const VISITED_ID_KEYS: [&str; 4] = ["id_cafe", "nomor", "cafe_id", "id"];

/// Key preference used when extracting a café's own id from a café object,
/// per §9's open-question resolution: `nomor` first, then `id_cafe`, then `id`.
const CAFE_ID_KEYS: [&str; 3] = ["nomor", "id_cafe", "id"];

fn extract_id_with_preference(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<i64> {
    for key in keys {
        if let Some(v) = obj.get(*key) {
            if v.is_null() {
                continue;
            }
            if let Some(id) = value_as_i64(v) {
                return Some(id);
            }
        }
    }
    None
}

fn value_as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn value_as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Parses `cafe_telah_dikunjungi` / `visited`, which may be a native array of
/// objects/ints, a JSON-encoded string, or a comma-separated string.
/// Non-parseable entries are dropped silently.
pub fn parse_visited_list(raw: &Value) -> Vec<CafeId> {
    let items: Vec<Value> = match raw {
        Value::Array(items) => items.clone(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                serde_json::from_str::<Vec<Value>>(trimmed).unwrap_or_default()
            } else if trimmed.contains(',') {
                trimmed
                    .split(',')
                    .map(|part| Value::String(part.trim().to_string()))
                    .collect()
            } else if !trimmed.is_empty() {
                vec![Value::String(trimmed.to_string())]
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(obj) => extract_id_with_preference(&obj, &VISITED_ID_KEYS),
            other => value_as_i64(&other),
        })
        .collect()
}

/// Parses `menu_yang_disukai`, which may be a native array of objects or a
/// JSON-encoded string of the same shape.
pub fn parse_liked_menus(raw: &Value) -> Vec<LikedMenu> {
    let items: Vec<Value> = match raw {
        Value::Array(items) => items.clone(),
        Value::String(s) => serde_json::from_str::<Vec<Value>>(s.trim()).unwrap_or_default(),
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let cafe_id = obj
                .get("cafe_id")
                .or_else(|| obj.get("id_cafe"))
                .and_then(value_as_i64)?;
            let menu_name = obj
                .get("menu_name")
                .or_else(|| obj.get("nama_menu"))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())?;
            let price = obj
                .get("price")
                .or_else(|| obj.get("harga"))
                .and_then(value_as_i64)
                .unwrap_or(0);
            Some(LikedMenu {
                cafe_id,
                menu_name,
                price: price.max(0),
            })
        })
        .collect()
}

/// Parses a café object from `/api/data`, `/api/cafe/{id}`, etc.
pub fn parse_cafe(value: &Value) -> Option<Cafe> {
    let obj = value.as_object()?;
    let cafe_id = extract_id_with_preference(obj, &CAFE_ID_KEYS)?;
    let name = obj
        .get("nama_kafe")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let address = obj
        .get("alamat")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let rating = obj
        .get("rating")
        .and_then(value_as_f64)
        .unwrap_or(0.0)
        .clamp(0.0, 5.0);
    let facilities = obj
        .get("fasilitas")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    Some(Cafe {
        cafe_id,
        name,
        address,
        rating,
        facilities,
    })
}

/// Parses a single review record, accepting either probability triples or a
/// categorical label, and tolerating the `prob_pos`/`prob_neu`/`prob_neg`
/// alternate keys the collaborator API's sentiment endpoint sometimes uses.
pub fn parse_review(value: &Value) -> Review {
    let Some(obj) = value.as_object() else {
        return Review::Unknown;
    };

    let p_pos = obj
        .get("p_pos")
        .or_else(|| obj.get("prob_pos"))
        .and_then(value_as_f64);
    let p_neu = obj
        .get("p_neu")
        .or_else(|| obj.get("prob_neu"))
        .and_then(value_as_f64);
    let p_neg = obj
        .get("p_neg")
        .or_else(|| obj.get("prob_neg"))
        .and_then(value_as_f64);

    if p_pos.unwrap_or(0.0) > 0.0 || p_neu.unwrap_or(0.0) > 0.0 || p_neg.unwrap_or(0.0) > 0.0 {
        return Review::Probabilistic {
            p_pos: p_pos.unwrap_or(0.0),
            p_neu: p_neu.unwrap_or(0.0),
            p_neg: p_neg.unwrap_or(0.0),
        };
    }

    let label = obj
        .get("sentiment")
        .or_else(|| obj.get("label"))
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_lowercase());

    match label {
        Some(label) if !label.is_empty() => Review::Labeled { label },
        _ => Review::Unknown,
    }
}

/// Parses the `/api/sentiment/{id}` response, which may be a bare list of
/// reviews, `{"reviews": [...]}`, or some other object whose first list-typed
/// value is the review list (matching the original's fallback scan).
pub fn extract_review_list(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Object(obj) => {
            if let Some(Value::Array(items)) = obj.get("reviews") {
                return items.clone();
            }
            for v in obj.values() {
                if let Value::Array(items) = v {
                    return items.clone();
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}
