//! The `Default` field kind: an untyped pass-through slot.
//!
//! Holds any JSON value verbatim. Useful for carrying data a form round-trips
//! without editing, and as the fallback shape custom widgets build on.

use serde::Deserialize;
use serde_json::Value;

use crate::error::FormError;
use crate::field::parse_config;
use crate::mapping::OptionMapping;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GenericConfig {
    value: Option<Value>,
    default_value: Option<Value>,
}

/// State of a `Default` field.
#[derive(Debug, Clone)]
pub struct GenericState {
    pub value: Value,
    pub default_value: Value,
    pub(crate) mapping: OptionMapping,
}

impl GenericState {
    pub(crate) fn build(config: &Value, path: &str) -> Result<(Self, Option<Value>), FormError> {
        let parsed: GenericConfig = parse_config(config, path)?;
        let initial = parsed.value.or(parsed.default_value.clone());
        let state = Self {
            value: Value::Null,
            default_value: parsed.default_value.unwrap_or(Value::Null),
            mapping: OptionMapping::from_config(config, path)?,
        };
        Ok((state, initial))
    }

    pub(crate) fn inject(&mut self, provided: &Value) {
        self.value = provided.clone();
    }

    pub(crate) fn set(&mut self, value: &Value) {
        self.value = value.clone();
    }

    /// List-style append for array-shaped values; refuses duplicates.
    pub(crate) fn add(&mut self, value: Value, index: Option<usize>) -> bool {
        if self.value.is_null() {
            self.value = Value::Array(Vec::new());
        }
        let Value::Array(items) = &mut self.value else {
            return false;
        };
        if items.contains(&value) {
            return false;
        }
        match index {
            Some(i) if i < items.len() => items.insert(i, value),
            _ => items.push(value),
        }
        true
    }

    pub(crate) fn remove(&mut self, value: &Value) -> bool {
        let Value::Array(items) = &mut self.value else {
            return false;
        };
        let before = items.len();
        items.retain(|v| v != value);
        before != items.len()
    }

    pub(crate) fn raw_value(&self) -> Value {
        self.value.clone()
    }

    pub(crate) fn default_value_json(&self) -> Value {
        self.default_value.clone()
    }
}
