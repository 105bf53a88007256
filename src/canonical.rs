//! The canonical-form hasher: produces a stable fingerprint for any JSON value,
//! used by `enum` (member equality) and `uniqueItems`.
use serde_json::Value;
use std::hash::{Hash, Hasher};

/// Render `value` into a deterministic text form: object keys are sorted
/// lexically, strings are escaped, and every value kind gets a distinguishing
/// tag so that e.g. the number `1` and the string `"1"` never collide.
#[must_use]
pub(crate) fn canonical_key(value: &Value) -> String {
    let mut buffer = String::new();
    write_canonical(value, &mut buffer);
    buffer
}

fn write_canonical(value: &Value, buffer: &mut String) {
    match value {
        Value::Null => buffer.push_str("n:null"),
        Value::Bool(b) => {
            buffer.push_str("b:");
            buffer.push_str(if *b { "true" } else { "false" });
        }
        Value::Number(num) => {
            buffer.push_str("#:");
            buffer.push_str(&num.to_string());
        }
        Value::String(s) => {
            buffer.push_str("s:");
            buffer.push_str(&s.len().to_string());
            buffer.push(':');
            for ch in s.chars() {
                match ch {
                    '\\' => buffer.push_str("\\\\"),
                    ':' => buffer.push_str("\\:"),
                    other => buffer.push(other),
                }
            }
        }
        Value::Array(items) => {
            buffer.push_str("a:[");
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    buffer.push(',');
                }
                write_canonical(item, buffer);
            }
            buffer.push(']');
        }
        Value::Object(map) => {
            buffer.push_str("o:{");
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for (idx, key) in keys.iter().enumerate() {
                if idx > 0 {
                    buffer.push(',');
                }
                write_canonical(&Value::String((*key).clone()), buffer);
                buffer.push(':');
                write_canonical(&map[*key], buffer);
            }
            buffer.push('}');
        }
    }
}

/// A fixed-size digest over `value`'s canonical form. Collisions are possible
/// in principle; callers that need exact equality (as `enum` does) should
/// compare [`canonical_key`] strings rather than relying on the digest alone.
#[must_use]
pub(crate) fn canonical_hash(value: &Value) -> u64 {
    let mut hasher = ahash::AHasher::default();
    canonical_key(value).hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::{canonical_hash, canonical_key};
    use serde_json::json;

    #[test]
    fn integer_and_numeric_string_are_distinct() {
        assert_ne!(canonical_key(&json!(1)), canonical_key(&json!("1")));
    }

    #[test]
    fn object_key_order_does_not_matter() {
        let a = json!({"a": 1, "b": 2});
        let b = json!({"b": 2, "a": 1});
        assert_eq!(canonical_key(&a), canonical_key(&b));
        assert_eq!(canonical_hash(&a), canonical_hash(&b));
    }

    #[test]
    fn structurally_different_arrays_differ() {
        assert_ne!(canonical_key(&json!([1, 2])), canonical_key(&json!([2, 1])));
    }
}
