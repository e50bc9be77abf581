//! The `Slider` field: a number or a `{min, max}` range, re-quantized to
//! the step's decimal precision on every write so repeated arithmetic
//! never accumulates float noise (`0.2 + 0.1` stays `0.3` at step `0.1`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use maquette_carton::num::{precision_of, quantize};

use crate::error::FormError;
use crate::field::parse_config;

/// A slider's value shape.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SliderValue {
    Range { min: f64, max: f64 },
    Single(f64),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SliderConfig {
    value: Option<Value>,
    default_value: Option<Value>,
    min: Option<f64>,
    max: Option<f64>,
    step: f64,
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            value: None,
            default_value: None,
            min: None,
            max: None,
            step: 1.0,
        }
    }
}

/// State of a `Slider` field.
#[derive(Debug, Clone)]
pub struct SliderState {
    pub value: Option<SliderValue>,
    pub default_value: Option<SliderValue>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: f64,
    precision: u32,
}

impl SliderState {
    pub(crate) fn build(config: &Value, path: &str) -> Result<(Self, Option<Value>), FormError> {
        let parsed: SliderConfig = parse_config(config, path)?;
        let initial = parsed.value.or(parsed.default_value.clone());
        let precision = precision_of(parsed.step);
        let state = Self {
            value: None,
            default_value: parsed
                .default_value
                .and_then(|v| SliderValue::deserialize(&v).ok())
                .map(|v| Self::quantized(v, precision)),
            min: parsed.min,
            max: parsed.max,
            step: parsed.step,
            precision,
        };
        Ok((state, initial))
    }

    fn quantized(value: SliderValue, precision: u32) -> SliderValue {
        match value {
            SliderValue::Single(v) => SliderValue::Single(quantize(v, precision)),
            SliderValue::Range { min, max } => SliderValue::Range {
                min: quantize(min, precision),
                max: quantize(max, precision),
            },
        }
    }

    pub(crate) fn inject(&mut self, provided: &Value) {
        self.value = SliderValue::deserialize(provided)
            .ok()
            .map(|v| Self::quantized(v, self.precision));
    }

    pub(crate) fn set(&mut self, value: &Value) {
        self.inject(value);
    }

    /// Set a single value directly, quantized to the step precision.
    pub fn set_number(&mut self, value: f64) {
        self.value = Some(Self::quantized(SliderValue::Single(value), self.precision));
    }

    /// Set a range directly, both bounds quantized.
    pub fn set_range(&mut self, min: f64, max: f64) {
        self.value = Some(Self::quantized(SliderValue::Range { min, max }, self.precision));
    }

    pub(crate) fn raw_value(&self) -> Value {
        match &self.value {
            Some(v) => serde_json::to_value(v).unwrap_or(Value::Null),
            None => Value::Null,
        }
    }

    pub(crate) fn default_value_json(&self) -> Value {
        match &self.default_value {
            Some(v) => serde_json::to_value(v).unwrap_or(Value::Null),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_precision_quantizes_writes() {
        let (mut state, _) = SliderState::build(&json!({"step": 0.1}), "/opacity").unwrap();
        state.set_number(0.2 + 0.1);
        assert_eq!(state.value, Some(SliderValue::Single(0.3)));
    }

    #[test]
    fn test_range_value() {
        let (mut state, _) = SliderState::build(&json!({"step": 0.5}), "/window").unwrap();
        state.inject(&json!({"min": 1.25, "max": 3.75}));
        assert_eq!(state.value, Some(SliderValue::Range { min: 1.3, max: 3.8 }));
        assert_eq!(state.raw_value(), json!({"min": 1.3, "max": 3.8}));
    }

    #[test]
    fn test_integer_step_rounds_whole() {
        let (mut state, _) = SliderState::build(&json!({}), "/level").unwrap();
        state.set_number(2.6);
        assert_eq!(state.value, Some(SliderValue::Single(3.0)));
    }

    #[test]
    fn test_unparseable_clears() {
        let (mut state, _) = SliderState::build(&json!({}), "/level").unwrap();
        state.set_number(1.0);
        state.inject(&json!(null));
        assert!(state.value.is_none());
    }
}
