//! Structural diff and merge over JSON values.
//!
//! One set of helpers answers "did anything actually change" for the reducer
//! (partial updates), the persistence layer (hydration merge, redundant write
//! suppression) and the registry (is this new information). Empty strings,
//! empty collections and nulls all count as "absent".

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Strip nulls and empty strings/arrays/objects, recursively.
///
/// Returns `Value::Null` when nothing meaningful is left.
pub fn normalize(value: &Value) -> Value {
    match value {
        Value::String(s) if s.is_empty() => Value::Null,
        Value::Array(items) => {
            let items: Vec<Value> = items.iter().map(normalize).collect();
            if items.is_empty() {
                Value::Null
            } else {
                Value::Array(items)
            }
        }
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), normalize(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if map.is_empty() {
                Value::Null
            } else {
                Value::Object(map)
            }
        }
        other => other.clone(),
    }
}

/// Equality that treats empty and absent the same
pub fn equivalent(a: &Value, b: &Value) -> bool {
    normalize(a) == normalize(b)
}

/// [`equivalent`] for any serializable values. Serialization failures compare
/// unequal.
pub fn same<T: Serialize + ?Sized, U: Serialize + ?Sized>(a: &T, b: &U) -> bool {
    match (serde_json::to_value(a), serde_json::to_value(b)) {
        (Ok(a), Ok(b)) => equivalent(&a, &b),
        _ => false,
    }
}

/// Object-level merge where `overlay` keys win and `base`-only keys survive.
/// A non-object on either side means the overlay replaces the base.
pub fn shallow_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut merged = base.clone();
            for (key, value) in overlay {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Like [`shallow_merge`], but overlay fields that are absent after
/// normalization never erase base fields. Used when the overlay may be a
/// less complete copy of the same thing.
pub fn merge_present(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut merged = base.clone();
            for (key, value) in overlay {
                if !normalize(value).is_null() {
                    merged.insert(key.clone(), value.clone());
                }
            }
            Value::Object(merged)
        }
        (base, overlay) if normalize(overlay).is_null() => base.clone(),
        (_, overlay) => overlay.clone(),
    }
}

/// Apply a partial update to `target`.
///
/// The patch is serialized and its fields merged over the target's. Returns
/// `None` when the merge changes nothing (including nested values) or when
/// the merged value no longer fits `T`.
pub fn apply_patch<T, P>(target: &T, patch: &P) -> Option<T>
where
    T: Serialize + DeserializeOwned,
    P: Serialize + ?Sized,
{
    let current = serde_json::to_value(target).ok()?;
    let patch = serde_json::to_value(patch).ok()?;
    let merged = merge_present(&current, &patch);
    if equivalent(&current, &merged) {
        return None;
    }
    match serde_json::from_value(merged) {
        Ok(updated) => Some(updated),
        Err(e) => {
            tracing::warn!(error = %e, "patch produced an invalid value, ignoring");
            None
        }
    }
}
