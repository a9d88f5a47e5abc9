//! Row values.
//!
//! Rows have no schema known ahead of time, so they stay dynamic JSON maps.
//! Join keys and row IDs are compared as strings.

use serde_json::Value as JsonValue;

/// A row: column name to value, including the reserved `_id` key.
pub type Row = serde_json::Map<String, JsonValue>;

/// Column holding the row identifier.
pub const ROW_ID_COLUMN: &str = "_id";

/// Renders a cell value as a comparable string.
///
/// Null renders empty. Whole numbers render without a fractional part, so
/// `42`, `42.0` and `"42"` all produce the same key.
#[must_use]
pub fn value_to_key(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
                    _ => n.to_string(),
                }
            }
        }
        JsonValue::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Returns the string form of `row[column]`, empty if missing or null.
#[must_use]
pub fn row_string(row: &Row, column: &str) -> String {
    row.get(column).map(value_to_key).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_render_without_trailing_zero() {
        assert_eq!(value_to_key(&json!(42)), "42");
        assert_eq!(value_to_key(&json!(42.0)), "42");
        assert_eq!(value_to_key(&json!(-3.0)), "-3");
        assert_eq!(value_to_key(&json!(2.5)), "2.5");
    }

    #[test]
    fn scalars_and_null() {
        assert_eq!(value_to_key(&json!("A-17")), "A-17");
        assert_eq!(value_to_key(&json!(true)), "true");
        assert_eq!(value_to_key(&JsonValue::Null), "");
    }

    #[test]
    fn compound_values_render_as_json() {
        assert_eq!(value_to_key(&json!(["x", 1])), r#"["x",1]"#);
        assert_eq!(value_to_key(&json!({"k": "v"})), r#"{"k":"v"}"#);
    }

    #[test]
    fn row_string_missing_column_is_empty() {
        let row: Row = serde_json::from_value(json!({"_id": "r1", "Code": 7})).expect("row");
        assert_eq!(row_string(&row, "_id"), "r1");
        assert_eq!(row_string(&row, "Code"), "7");
        assert_eq!(row_string(&row, "Missing"), "");
    }
}
