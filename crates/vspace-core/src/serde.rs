//! Canonical JSON encoding and payload fingerprints.

use ::serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::errors::{EngineError, ErrorInfo};

fn serde_error(code: &str, err: impl ToString) -> EngineError {
    EngineError::Serde(ErrorInfo::new(code, err.to_string()))
}

/// Reorders every object's keys ascending, whichever map backend serde_json
/// was built with.
fn sort_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            for (key, mut child) in entries {
                sort_keys(&mut child);
                map.insert(key, child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sort_keys),
        _ => {}
    }
}

/// Compact JSON with sorted keys; equal payloads give equal bytes.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, EngineError> {
    let mut value = to_json_value(value)?;
    sort_keys(&mut value);
    serde_json::to_vec(&value).map_err(|err| serde_error("json-write", err))
}

/// Converts a typed payload into a JSON value.
pub fn to_json_value<T: Serialize>(value: &T) -> Result<Value, EngineError> {
    serde_json::to_value(value).map_err(|err| serde_error("json-encode", err))
}

/// Decodes a typed payload from a JSON value.
pub fn from_json_value<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, EngineError> {
    serde_json::from_value(value).map_err(|err| serde_error("json-decode", err))
}

/// Lowercase hex SHA-256 of [`canonical_json_bytes`].
pub fn fingerprint<T: Serialize>(value: &T) -> Result<String, EngineError> {
    Ok(format!("{:x}", Sha256::digest(canonical_json_bytes(value)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_ignores_key_order() {
        let a = json!({"n_points": 20, "variable_ids": [1, 2], "nested": {"b": 1, "a": 2}});
        let b = json!({"variable_ids": [1, 2], "nested": {"a": 2, "b": 1}, "n_points": 20});
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
        assert_eq!(fingerprint(&a).unwrap().len(), 64);
        let c = json!({"n_points": 21, "variable_ids": [1, 2], "nested": {"b": 1, "a": 2}});
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&c).unwrap());
    }

    #[test]
    fn canonical_bytes_sort_keys() {
        let bytes = canonical_json_bytes(&json!({"b": 1, "a": [{"d": 0, "c": 1}]})).unwrap();
        assert_eq!(bytes, br#"{"a":[{"c":1,"d":0}],"b":1}"#.to_vec());
    }
}
