//! Built-in validation rules.
//!
//! The rule set and its semantics follow the classic form-validation
//! conventions: `min`/`max`/`between`/`size` compare the numeric value of
//! numbers and the length of strings and arrays; every rule except
//! `required` passes vacuously when the field is empty.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"));

static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(https?://)?((([a-z\d]([a-z\d-]*[a-z\d])*)\.?)+[a-z]{2,}|((\d{1,3}\.){3}\d{1,3}))(:\d+)?(/[-a-z\d%_.~+]*)*(\?[;&a-z\d%_.~+=-]*)?(#[-a-z\d_]*)?$",
    )
    .expect("url pattern")
});

/// Whether a value counts as present for validation purposes.
///
/// `null`, the empty string and the empty array are absent.
pub(crate) fn has_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// The comparable size of a value: numeric value for numbers, length for
/// strings and arrays.
fn size_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(items) => Some(items.len() as f64),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_comparable_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn param_number(params: &[String], index: usize) -> Option<f64> {
    params.get(index).and_then(|p| p.parse().ok())
}

fn chars_match(value: &Value, pred: impl Fn(char) -> bool) -> bool {
    match value {
        Value::String(s) => !s.is_empty() && s.chars().all(pred),
        _ => false,
    }
}

/// Evaluate a built-in rule. Returns `None` for unknown rule names.
pub(crate) fn check(name: &str, params: &[String], value: &Value) -> Option<bool> {
    let passed = match name {
        "required" => has_value(value),
        "email" => matches!(value, Value::String(s) if EMAIL.is_match(s)),
        "url" => matches!(value, Value::String(s) if URL.is_match(s)),
        "numeric" => as_number(value).is_some(),
        "integer" => match as_number(value) {
            Some(n) => n.fract() == 0.0,
            None => false,
        },
        "alpha" => chars_match(value, |c| c.is_alphabetic()),
        "alpha_num" => chars_match(value, |c| c.is_alphanumeric()),
        "alpha_dash" => chars_match(value, |c| c.is_alphanumeric() || c == '-' || c == '_'),
        "digits" => match (as_comparable_string(value), param_number(params, 0)) {
            (Some(s), Some(n)) => s.len() as f64 == n && s.chars().all(|c| c.is_ascii_digit()),
            _ => false,
        },
        "min" => match (size_of(value), param_number(params, 0)) {
            (Some(size), Some(min)) => size >= min,
            _ => false,
        },
        "max" => match (size_of(value), param_number(params, 0)) {
            (Some(size), Some(max)) => size <= max,
            _ => false,
        },
        "between" => match (size_of(value), param_number(params, 0), param_number(params, 1)) {
            (Some(size), Some(min), Some(max)) => size >= min && size <= max,
            _ => false,
        },
        "size" => match (size_of(value), param_number(params, 0)) {
            (Some(size), Some(expected)) => size == expected,
            _ => false,
        },
        "in" => match as_comparable_string(value) {
            Some(s) => params.iter().any(|p| p == &s),
            None => false,
        },
        "not_in" => match as_comparable_string(value) {
            Some(s) => !params.iter().any(|p| p == &s),
            None => false,
        },
        "accepted" => match value {
            Value::Bool(b) => *b,
            Value::String(s) => matches!(s.as_str(), "yes" | "on" | "1" | "true"),
            Value::Number(n) => n.as_f64() == Some(1.0),
            _ => false,
        },
        "boolean" => match value {
            Value::Bool(_) => true,
            Value::String(s) => matches!(s.as_str(), "true" | "false" | "0" | "1"),
            Value::Number(n) => matches!(n.as_f64(), Some(x) if x == 0.0 || x == 1.0),
            _ => false,
        },
        "string" => value.is_string(),
        "array" => value.is_array(),
        _ => return None,
    };
    Some(passed)
}

/// Default error message for a built-in rule, `:placeholder`s resolved.
pub(crate) fn message_for(name: &str, label: &str, params: &[String]) -> String {
    let template = match name {
        "required" => "The :attribute field is required.",
        "email" => "The :attribute format is invalid.",
        "url" => "The :attribute format is invalid.",
        "numeric" => "The :attribute must be a number.",
        "integer" => "The :attribute must be an integer.",
        "alpha" => "The :attribute field must contain only alphabetic characters.",
        "alpha_num" => "The :attribute field must be alphanumeric.",
        "alpha_dash" => {
            "The :attribute field may only contain alpha-numeric characters, as well as dashes and underscores."
        }
        "digits" => "The :attribute must be :digits digits.",
        "min" => "The :attribute must be at least :min.",
        "max" => "The :attribute may not be greater than :max.",
        "between" => "The :attribute field must be between :min and :max.",
        "size" => "The :attribute must be :size.",
        "in" | "not_in" => "The selected :attribute is invalid.",
        "accepted" => "The :attribute must be accepted.",
        "boolean" => "The :attribute field must be true or false.",
        "string" => "The :attribute must be a string.",
        "array" => "The :attribute must be an array.",
        "regex" => "The :attribute format is invalid.",
        _ => "The :attribute field is invalid.",
    };
    substitute(template, label, name, params)
}

/// Resolve `:placeholder`s in a message template.
pub(crate) fn substitute(template: &str, label: &str, name: &str, params: &[String]) -> String {
    let empty = String::new();
    let first = params.first().unwrap_or(&empty);
    let second = params.get(1).unwrap_or(&empty);
    template
        .replace(":attribute", label)
        .replace(":digits", first)
        .replace(":size", first)
        .replace(":min", first)
        .replace(":max", if name == "between" { second } else { first })
}
