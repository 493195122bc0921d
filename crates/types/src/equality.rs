//! Structural equality over JSON values.
//!
//! This is the equality used by `enum`, `const`, and `uniqueItems`:
//! numbers compare by mathematical value, objects compare member-wise
//! ignoring insertion order, arrays compare element-wise in order. It is
//! reflexive, symmetric, and transitive.

use crate::number::JsonNumber;
use serde_json::Value;

/// Structural equality with mathematical number comparison.
#[must_use]
pub fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => {
            JsonNumber::from_number(x) == JsonNumber::from_number(y)
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| json_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, value)| y.get(key).is_some_and(|other| json_equal(value, other)))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_by_mathematical_value() {
        assert!(json_equal(&json!(1), &json!(1.0)));
        assert!(json_equal(&json!(1e2), &json!(100)));
        assert!(!json_equal(&json!(1), &json!(2)));
    }

    #[test]
    fn test_objects_ignore_member_order() {
        let a = serde_json::from_str::<Value>(r#"{"x": 1, "y": [2.0]}"#).unwrap();
        let b = serde_json::from_str::<Value>(r#"{"y": [2], "x": 1}"#).unwrap();
        assert!(json_equal(&a, &b));
    }

    #[test]
    fn test_arrays_are_ordered() {
        assert!(!json_equal(&json!([1, 2]), &json!([2, 1])));
        assert!(json_equal(&json!([1, [2, 3]]), &json!([1.0, [2, 3.0]])));
    }

    #[test]
    fn test_cross_type_never_equal() {
        assert!(!json_equal(&json!(null), &json!(false)));
        assert!(!json_equal(&json!(0), &json!(false)));
        assert!(!json_equal(&json!(""), &json!(null)));
        assert!(!json_equal(&json!({}), &json!([])));
    }

    #[test]
    fn test_equality_relation_laws() {
        let values = [
            json!(1),
            json!(1.0),
            json!("1"),
            json!([{"a": 1.0}]),
            json!([{"a": 1}]),
            json!(null),
        ];
        for x in &values {
            assert!(json_equal(x, x));
            for y in &values {
                assert_eq!(json_equal(x, y), json_equal(y, x));
                for z in &values {
                    if json_equal(x, y) && json_equal(y, z) {
                        assert!(json_equal(x, z));
                    }
                }
            }
        }
    }
}
