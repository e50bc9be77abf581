//! Option matching and return-value mapping.
//!
//! Option-backed fields resolve the values handed to them against their
//! option list instead of storing them verbatim. A provided value matches
//! an option when the configured mapping keys agree: a scalar matches a
//! scalar option by equality, or an object option whose mapping keys all
//! equal the scalar; an object matches when every mapping key is defined
//! on both sides with equal values.
//!
//! On the way out, `mappingReturn` projects option objects down to one key
//! (or a subset of keys), `returnSingle` collapses a list to its first
//! element, and `emptyToNull` collapses empty output to `null` — in that
//! order.

use serde::Deserialize;
use serde_json::Value;

use crate::error::FormError;
use crate::field::parse_config;
use crate::value::is_empty_value;

/// One key or several; several means all of them must agree for a match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MappingKeys {
    Single(String),
    Multiple(Vec<String>),
}

impl MappingKeys {
    pub fn keys(&self) -> &[String] {
        match self {
            MappingKeys::Single(key) => std::slice::from_ref(key),
            MappingKeys::Multiple(keys) => keys,
        }
    }
}

impl Default for MappingKeys {
    fn default() -> Self {
        MappingKeys::Single("value".to_string())
    }
}

/// The mapping configuration of an option-backed field.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionMapping {
    /// Key(s) a provided value is matched against
    pub mapping_value: MappingKeys,
    /// Key holding an option's display label
    pub mapping_label: String,
    /// Key(s) projected out of a selected option; `None` returns it whole
    pub mapping_return: Option<MappingKeys>,
    /// Collapse the output list to its first element
    pub return_single: bool,
}

impl Default for OptionMapping {
    fn default() -> Self {
        Self {
            mapping_value: MappingKeys::default(),
            mapping_label: "label".to_string(),
            mapping_return: None,
            return_single: false,
        }
    }
}

impl OptionMapping {
    /// Parse the mapping properties out of a field declaration.
    pub(crate) fn from_config(config: &Value, path: &str) -> Result<Self, FormError> {
        parse_config(config, path)
    }
}

pub(crate) fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// Whether `option` matches a provided value under the mapping keys.
pub(crate) fn matches_option(option: &Value, provided: &Value, keys: &MappingKeys) -> bool {
    if is_scalar(provided) {
        if is_scalar(option) {
            return option == provided;
        }
        keys.keys().iter().all(|key| option.get(key) == Some(provided))
    } else if provided.is_object() {
        keys.keys().iter().all(|key| match (option.get(key), provided.get(key)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        })
    } else {
        false
    }
}

/// First option matching `provided`, scanning in option order.
pub(crate) fn find_match<'a>(
    options: &'a [Value],
    provided: &Value,
    keys: &MappingKeys,
) -> Option<&'a Value> {
    options.iter().find(|option| matches_option(option, provided, keys))
}

/// Apply the output transforms to a raw field value.
pub(crate) fn map_return_value(value: Value, mapping: &OptionMapping, empty_to_null: bool) -> Value {
    let value = match &mapping.mapping_return {
        Some(keys) => match value {
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|item| project(item, keys)).collect())
            }
            other => project(other, keys),
        },
        None => value,
    };
    let value = if mapping.return_single {
        match value {
            Value::Array(mut items) => {
                if items.is_empty() {
                    Value::Null
                } else {
                    items.swap_remove(0)
                }
            }
            other => other,
        }
    } else {
        value
    };
    if empty_to_null && is_empty_value(&value) {
        return Value::Null;
    }
    value
}

fn project(value: Value, keys: &MappingKeys) -> Value {
    if !value.is_object() {
        return value;
    }
    match keys {
        MappingKeys::Single(key) => value.get(key).cloned().unwrap_or(Value::Null),
        MappingKeys::Multiple(keys) => {
            let mut out = serde_json::Map::new();
            for key in keys {
                out.insert(key.clone(), value.get(key).cloned().unwrap_or(Value::Null));
            }
            Value::Object(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_matches_scalar_option() {
        let keys = MappingKeys::default();
        assert!(matches_option(&json!("fr"), &json!("fr"), &keys));
        assert!(!matches_option(&json!("fr"), &json!("uk"), &keys));
    }

    #[test]
    fn test_scalar_matches_object_option() {
        let keys = MappingKeys::default();
        let option = json!({"value": "fr", "label": "France"});
        assert!(matches_option(&option, &json!("fr"), &keys));
        assert!(!matches_option(&option, &json!("de"), &keys));
    }

    #[test]
    fn test_object_match_requires_all_keys_defined() {
        let keys = MappingKeys::Multiple(vec!["id".into(), "scope".into()]);
        let option = json!({"id": 7, "scope": "eu", "label": "x"});
        assert!(matches_option(&option, &json!({"id": 7, "scope": "eu"}), &keys));
        // missing key on the provided side is not a wildcard
        assert!(!matches_option(&option, &json!({"id": 7}), &keys));
        assert!(!matches_option(&option, &json!({"id": 7, "scope": "us"}), &keys));
    }

    #[test]
    fn test_find_match_takes_first() {
        let options = vec![
            json!({"value": "a", "rank": 1}),
            json!({"value": "a", "rank": 2}),
        ];
        let hit = find_match(&options, &json!("a"), &MappingKeys::default()).unwrap();
        assert_eq!(hit["rank"], 1);
    }

    #[test]
    fn test_map_return_projection_then_collapse() {
        let mapping = OptionMapping {
            mapping_return: Some(MappingKeys::Single("value".into())),
            return_single: true,
            ..OptionMapping::default()
        };
        let raw = json!([{"value": "fr", "label": "France"}]);
        assert_eq!(map_return_value(raw, &mapping, false), json!("fr"));
        assert_eq!(map_return_value(json!([]), &mapping, false), json!(null));
    }

    #[test]
    fn test_map_return_multiple_keys() {
        let mapping = OptionMapping {
            mapping_return: Some(MappingKeys::Multiple(vec!["id".into(), "name".into()])),
            ..OptionMapping::default()
        };
        let raw = json!([{"id": 1, "name": "a", "extra": true}]);
        assert_eq!(
            map_return_value(raw, &mapping, false),
            json!([{"id": 1, "name": "a"}])
        );
    }

    #[test]
    fn test_empty_to_null_collapse() {
        let mapping = OptionMapping::default();
        assert_eq!(map_return_value(json!(""), &mapping, true), json!(null));
        assert_eq!(map_return_value(json!([]), &mapping, true), json!(null));
        assert_eq!(map_return_value(json!(""), &mapping, false), json!(""));
    }
}
