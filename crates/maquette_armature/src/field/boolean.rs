//! Boolean field kinds (`CheckBox`, `Toggle`).

use serde::Deserialize;
use serde_json::Value;

use crate::error::FormError;
use crate::field::parse_config;
use crate::value::truthy;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BoolConfig {
    value: Option<Value>,
    default_value: Option<Value>,
}

/// State of a `CheckBox` or `Toggle` field. Injected values are coerced
/// to a boolean by truthiness.
#[derive(Debug, Clone, Default)]
pub struct BoolState {
    pub value: bool,
    pub default_value: bool,
}

impl BoolState {
    pub(crate) fn build(config: &Value, path: &str) -> Result<(Self, Option<Value>), FormError> {
        let parsed: BoolConfig = parse_config(config, path)?;
        let initial = parsed.value.or(parsed.default_value.clone());
        let state = Self {
            value: false,
            default_value: parsed.default_value.as_ref().is_some_and(truthy),
        };
        Ok((state, initial))
    }

    pub(crate) fn inject(&mut self, provided: &Value) {
        self.value = truthy(provided);
    }

    pub(crate) fn set(&mut self, value: &Value) {
        self.value = truthy(value);
    }

    pub(crate) fn raw_value(&self) -> Value {
        Value::Bool(self.value)
    }

    pub(crate) fn default_value_json(&self) -> Value {
        Value::Bool(self.default_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthy_coercion() {
        let (mut state, initial) = BoolState::build(&json!({"value": "yes"}), "/flag").unwrap();
        assert_eq!(initial, Some(json!("yes")));
        state.inject(&json!("yes"));
        assert!(state.value);
        state.inject(&json!(0));
        assert!(!state.value);
        state.inject(&json!(null));
        assert!(!state.value);
    }
}
