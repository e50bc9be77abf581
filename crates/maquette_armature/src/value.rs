//! Small JSON value helpers shared across field kinds.

use serde_json::Value;

/// Whether a value is "empty" for output purposes: `null`, `""` or `[]`.
pub(crate) fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// JavaScript-style truthiness, used by the boolean field kinds.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Coerce a scalar into the string a text input holds. Non-scalars and
/// `null` become the empty string.
pub(crate) fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Wrap a scalar in a one-element array; pass arrays through; `null`
/// becomes the empty array.
pub(crate) fn as_array(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_empty_value() {
        assert!(is_empty_value(&json!(null)));
        assert!(is_empty_value(&json!("")));
        assert!(is_empty_value(&json!([])));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(false)));
        assert!(!is_empty_value(&json!({})));
    }

    #[test]
    fn test_truthy() {
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!("no")));
        assert!(truthy(&json!([])));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!(null)));
    }

    #[test]
    fn test_as_array() {
        assert_eq!(as_array(&json!("fr")), vec![json!("fr")]);
        assert_eq!(as_array(&json!(["fr", "uk"])), vec![json!("fr"), json!("uk")]);
        assert!(as_array(&json!(null)).is_empty());
    }
}
