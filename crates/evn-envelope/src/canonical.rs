use serde::Serialize;

use crate::error::{EnvelopeError, EnvelopeResult};

/// Canonical JSON encoding: compact separators, object keys sorted.
///
/// Serialization goes through `serde_json::Value`, whose object map keeps
/// keys in sorted order, so logically identical structures produce
/// identical bytes regardless of field declaration or insertion order.
/// Sealing and integrity hashing both run over this encoding.
pub fn canonical_json<T: Serialize>(value: &T) -> EnvelopeResult<Vec<u8>> {
    let value = serde_json::to_value(value)
        .map_err(|e| EnvelopeError::Serialization(e.to_string()))?;
    serde_json::to_vec(&value).map_err(|e| EnvelopeError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_matter() {
        let ab = json!({"a": 1, "b": 2});
        let ba = json!({"b": 2, "a": 1});
        assert_eq!(canonical_json(&ab).unwrap(), canonical_json(&ba).unwrap());
    }

    #[test]
    fn nested_objects_are_canonical() {
        let x = json!({"outer": {"z": 1, "a": {"q": true, "b": null}}});
        let y = json!({"outer": {"a": {"b": null, "q": true}, "z": 1}});
        assert_eq!(canonical_json(&x).unwrap(), canonical_json(&y).unwrap());
    }

    #[test]
    fn arrays_preserve_order() {
        let x = json!([1, 2, 3]);
        let y = json!([3, 2, 1]);
        assert_ne!(canonical_json(&x).unwrap(), canonical_json(&y).unwrap());
    }

    #[test]
    fn encoding_is_compact() {
        let bytes = canonical_json(&json!({"a": 1})).unwrap();
        assert_eq!(bytes, br#"{"a":1}"#);
    }

    #[test]
    fn structs_and_values_agree() {
        #[derive(serde::Serialize)]
        struct S {
            b: u32,
            a: u32,
        }
        let from_struct = canonical_json(&S { b: 2, a: 1 }).unwrap();
        let from_value = canonical_json(&json!({"a": 1, "b": 2})).unwrap();
        assert_eq!(from_struct, from_value);
    }
}
