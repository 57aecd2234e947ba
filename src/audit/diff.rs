//! Diff generation for audit logging
//!
//! Summarizes top-level field changes between two serialized item states.

use chrono::DateTime;
use serde_json::Value;

/// Fields that change on every write and are left out of summaries
const IGNORED_FIELDS: &[&str] = &["updatedAt"];

/// Generate a one-line summary of the changes from `before` to `after`
///
/// Returns `None` when nothing but ignored bookkeeping fields changed.
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let (before_obj, after_obj) = match (before, after) {
        (Value::Object(b), Value::Object(a)) => (b, a),
        _ if before != after => {
            return Some(format!(
                "{} -> {}",
                format_value("", before),
                format_value("", after)
            ))
        }
        _ => return None,
    };

    let mut changes = Vec::new();

    for (key, before_val) in before_obj {
        if IGNORED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        match after_obj.get(key) {
            Some(after_val) if after_val != before_val => changes.push(format!(
                "{}: {} -> {}",
                key,
                format_value(key, before_val),
                format_value(key, after_val)
            )),
            Some(_) => {}
            None => changes.push(format!(
                "{}: {} -> (removed)",
                key,
                format_value(key, before_val)
            )),
        }
    }

    for (key, after_val) in after_obj {
        if !before_obj.contains_key(key) && !IGNORED_FIELDS.contains(&key.as_str()) {
            changes.push(format!(
                "{}: (added) -> {}",
                key,
                format_value(key, after_val)
            ));
        }
    }

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

/// Format a JSON value for display; epoch-millisecond date fields print as dates
fn format_value(key: &str, value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if key.ends_with("Date") || key.ends_with("At") {
                if let Some(dt) = n.as_i64().and_then(DateTime::from_timestamp_millis) {
                    return dt.format("%Y-%m-%d").to_string();
                }
            }
            n.to_string()
        }
        Value::String(s) => {
            if s.chars().count() > 50 {
                let truncated: String = s.chars().take(47).collect();
                format!("\"{}...\"", truncated)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_change() {
        let before = json!({"name": "Netflix", "price": 10.5});
        let after = json!({"name": "Netflix", "price": 12.5});

        let diff = generate_diff(&before, &after).unwrap();
        assert_eq!(diff, "price: 10.5 -> 12.5");
    }

    #[test]
    fn test_date_fields_formatted() {
        let before = json!({"expiryDate": 1_704_067_200_000_i64});
        let after = json!({"expiryDate": 1_706_745_600_000_i64});

        let diff = generate_diff(&before, &after).unwrap();
        assert_eq!(diff, "expiryDate: 2024-01-01 -> 2024-02-01");
    }

    #[test]
    fn test_updated_at_ignored() {
        let before = json!({"name": "A", "updatedAt": 1});
        let after = json!({"name": "A", "updatedAt": 2});

        assert!(generate_diff(&before, &after).is_none());
    }

    #[test]
    fn test_added_and_removed() {
        let before = json!({"imageReference": "a.jpg"});
        let after = json!({"notificationConfig": "{}"});

        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("imageReference: \"a.jpg\" -> (removed)"));
        assert!(diff.contains("notificationConfig: (added) -> \"{}\""));
    }

    #[test]
    fn test_null_and_bool() {
        let before = json!({"price": null, "isActive": true});
        let after = json!({"price": 5, "isActive": false});

        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("price: null -> 5"));
        assert!(diff.contains("isActive: true -> false"));
    }

    #[test]
    fn test_long_string_truncation_is_char_safe() {
        let before = json!({"name": "é".repeat(100)});
        let after = json!({"name": "short"});

        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("...\""));
    }

    #[test]
    fn test_non_object_values() {
        assert_eq!(
            generate_diff(&json!(1), &json!(2)),
            Some("1 -> 2".to_string())
        );
        assert!(generate_diff(&json!("x"), &json!("x")).is_none());
    }
}
