//! Single-line text, text area and multi-value text fields.

use serde::Deserialize;
use serde_json::Value;

use crate::error::FormError;
use crate::field::parse_config;
use crate::value::{as_array, coerce_string};

/// How a text input interprets its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Text,
    Number,
    Password,
    Email,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TextConfig {
    value: Option<Value>,
    default_value: Option<Value>,
    input_type: InputType,
}

/// State of an `InputText` or `TextArea` field.
#[derive(Debug, Clone)]
pub struct TextState {
    pub value: String,
    pub default_value: String,
    pub input_type: InputType,
}

impl TextState {
    pub(crate) fn build(config: &Value, path: &str) -> Result<(Self, Option<Value>), FormError> {
        let parsed: TextConfig = parse_config(config, path)?;
        let initial = parsed.value.or(parsed.default_value.clone());
        let state = Self {
            value: String::new(),
            default_value: parsed
                .default_value
                .map(|v| coerce_string(&v))
                .unwrap_or_default(),
            input_type: parsed.input_type,
        };
        Ok((state, initial))
    }

    pub(crate) fn inject(&mut self, provided: &Value) {
        self.value = coerce_string(provided);
    }

    pub(crate) fn set(&mut self, value: &Value) {
        self.value = coerce_string(value);
    }

    /// Raw output: number inputs parse their content, everything else is
    /// the string as typed. Unparseable numbers come out as `null`.
    pub(crate) fn raw_value(&self) -> Value {
        match self.input_type {
            InputType::Number => self
                .value
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|n| serde_json::Number::from_f64(n).map(Value::Number))
                .unwrap_or(Value::Null),
            _ => Value::String(self.value.clone()),
        }
    }

    pub(crate) fn default_value_json(&self) -> Value {
        Value::String(self.default_value.clone())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TextMultipleConfig {
    value: Option<Value>,
    default_value: Option<Value>,
    max: Option<usize>,
}

/// State of an `InputTextMultiple` field: an ordered list of free-text
/// entries with an optional cap.
#[derive(Debug, Clone)]
pub struct TextMultipleState {
    pub value: Vec<Value>,
    pub default_value: Vec<Value>,
    pub max: Option<usize>,
}

impl TextMultipleState {
    pub(crate) fn build(config: &Value, path: &str) -> Result<(Self, Option<Value>), FormError> {
        let parsed: TextMultipleConfig = parse_config(config, path)?;
        let initial = parsed.value.or(parsed.default_value.clone());
        let state = Self {
            value: Vec::new(),
            default_value: parsed.default_value.map(|v| as_array(&v)).unwrap_or_default(),
            max: parsed.max,
        };
        Ok((state, initial))
    }

    fn at_capacity(&self) -> bool {
        self.max.is_some_and(|max| self.value.len() >= max)
    }

    pub(crate) fn inject(&mut self, provided: &Value) {
        self.value = as_array(provided);
        if let Some(max) = self.max {
            self.value.truncate(max);
        }
    }

    pub(crate) fn set(&mut self, value: &Value) {
        self.inject(value);
    }

    /// Append an entry, refusing duplicates and additions past `max`.
    pub(crate) fn add(&mut self, value: Value, index: Option<usize>) -> bool {
        if self.at_capacity() || self.value.contains(&value) {
            return false;
        }
        match index {
            Some(i) if i < self.value.len() => self.value.insert(i, value),
            _ => self.value.push(value),
        }
        true
    }

    pub(crate) fn remove(&mut self, value: &Value) -> bool {
        let before = self.value.len();
        self.value.retain(|v| v != value);
        before != self.value.len()
    }

    pub(crate) fn raw_value(&self) -> Value {
        Value::Array(self.value.clone())
    }

    pub(crate) fn default_value_json(&self) -> Value {
        Value::Array(self.default_value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_input_parses_output() {
        let (mut state, _) = TextState::build(&json!({"inputType": "number"}), "/amount").unwrap();
        state.set(&json!("12.5"));
        assert_eq!(state.raw_value(), json!(12.5));
        state.set(&json!("not a number"));
        assert_eq!(state.raw_value(), json!(null));
    }

    #[test]
    fn test_multiple_wraps_scalar_and_caps() {
        let (mut state, _) = TextMultipleState::build(&json!({"max": 2}), "/tags").unwrap();
        state.inject(&json!("alpha"));
        assert_eq!(state.raw_value(), json!(["alpha"]));

        assert!(state.add(json!("beta"), None));
        // duplicate refused
        assert!(!state.add(json!("beta"), None));
        // over capacity refused
        assert!(!state.add(json!("gamma"), None));
        assert_eq!(state.value.len(), 2);
    }

    #[test]
    fn test_multiple_inject_truncates_to_max() {
        let (mut state, _) = TextMultipleState::build(&json!({"max": 2}), "/tags").unwrap();
        state.inject(&json!(["a", "b", "c"]));
        assert_eq!(state.raw_value(), json!(["a", "b"]));
    }
}
