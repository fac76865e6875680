//! Common types used throughout ezyvet-sync
//!
//! Shared type aliases plus lenient accessors for wire values. The remote
//! API is inconsistent about numeric encoding (`"id": "123"` and
//! `"id": 123` both occur, booleans arrive as `true`, `1`, or `"1"`), so
//! every field read goes through the `JsonValueExt` accessors.

use serde_json::Value;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Location identifier used to key credentials and per-location settings
pub type LocationId = i64;

// ============================================================================
// Lenient value access
// ============================================================================

/// Extension trait for reading loosely-typed wire values
pub trait JsonValueExt {
    /// Read the value as an i64, accepting numbers and numeric strings
    fn as_i64_lenient(&self) -> Option<i64>;

    /// Read the value as a 0/1 integer, accepting booleans, numbers, and
    /// numeric strings
    fn as_bool_int(&self) -> Option<i32>;

    /// Read the value as an owned string, accepting strings and numbers
    fn as_string_lenient(&self) -> Option<String>;
}

impl JsonValueExt for Value {
    fn as_i64_lenient(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else {
                    s.parse::<i64>().ok().or_else(|| {
                        s.parse::<f64>().ok().map(|f| f as i64)
                    })
                }
            }
            _ => None,
        }
    }

    fn as_bool_int(&self) -> Option<i32> {
        match self {
            Value::Bool(b) => Some(i32::from(*b)),
            Value::Number(_) | Value::String(_) => {
                self.as_i64_lenient().map(|n| i32::from(n != 0))
            }
            _ => None,
        }
    }

    fn as_string_lenient(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Read a field from a record object, treating null as absent
pub fn field<'a>(record: &'a JsonObject, name: &str) -> Option<&'a Value> {
    record.get(name).filter(|v| !v.is_null())
}

/// Read an i64 field from a record, accepting numbers and numeric strings
pub fn field_i64(record: &JsonObject, name: &str) -> Option<i64> {
    field(record, name).and_then(JsonValueExt::as_i64_lenient)
}

/// Read a string field from a record
pub fn field_string(record: &JsonObject, name: &str) -> Option<String> {
    field(record, name).and_then(JsonValueExt::as_string_lenient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_as_i64_lenient() {
        assert_eq!(json!(42).as_i64_lenient(), Some(42));
        assert_eq!(json!("42").as_i64_lenient(), Some(42));
        assert_eq!(json!(" 7 ").as_i64_lenient(), Some(7));
        assert_eq!(json!(3.0).as_i64_lenient(), Some(3));
        assert_eq!(json!("").as_i64_lenient(), None);
        assert_eq!(json!(null).as_i64_lenient(), None);
        assert_eq!(json!("abc").as_i64_lenient(), None);
    }

    #[test]
    fn test_as_bool_int() {
        assert_eq!(json!(true).as_bool_int(), Some(1));
        assert_eq!(json!(false).as_bool_int(), Some(0));
        assert_eq!(json!(1).as_bool_int(), Some(1));
        assert_eq!(json!(0).as_bool_int(), Some(0));
        assert_eq!(json!("1").as_bool_int(), Some(1));
        assert_eq!(json!("0").as_bool_int(), Some(0));
        assert_eq!(json!(null).as_bool_int(), None);
    }

    #[test]
    fn test_field_helpers() {
        let record = json!({
            "id": "15",
            "name": "Surgery",
            "animal_id": null,
        });
        let obj = record.as_object().unwrap();

        assert_eq!(field_i64(obj, "id"), Some(15));
        assert_eq!(field_string(obj, "name"), Some("Surgery".to_string()));
        assert_eq!(field_i64(obj, "animal_id"), None);
        assert_eq!(field_i64(obj, "missing"), None);
    }
}
