//! Option-backed choice fields: `Select` (single) and the multi-choice
//! `DropdownSelect` / `GroupSelect` pair.

use compact_str::{format_compact, CompactString};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::FormError;
use crate::field::{parse_config, BuildContext};
use crate::mapping::{self, OptionMapping};
use crate::value::as_array;

use maquette_carton::next_uid;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SelectConfig {
    value: Option<Value>,
    default_value: Option<Value>,
    options: Vec<Value>,
    options_url: Option<String>,
    cache_options_url: bool,
    default_label: Option<String>,
    max: Option<usize>,
}

fn load_options(config: SelectConfig, ctx: &BuildContext) -> SelectConfig {
    let mut config = config;
    // cached URL data replaces the URL entirely, skipping the fetch
    if config.cache_options_url {
        if let Some(url) = &config.options_url {
            if let Some(data) = ctx.cache.get(url) {
                config.options = as_array(&data);
                config.options_url = None;
            }
        }
    }
    config
}

/// State of a single-choice `Select` field.
///
/// The selected option is stored whole; output mapping happens on read.
/// When an injected value matches nothing and no `defaultLabel` placeholder
/// is configured, the first option is selected.
#[derive(Debug, Clone)]
pub struct SelectState {
    pub options: Vec<Value>,
    pub options_url: Option<String>,
    pub cache_options_url: bool,
    pub default_label: Option<String>,
    pub default_value: Option<Value>,
    pub value: Option<Value>,
    pub(crate) mapping: OptionMapping,
    option_ids: Vec<CompactString>,
    ids_to_index: FxHashMap<CompactString, usize>,
}

impl SelectState {
    pub(crate) fn build(
        config: &Value,
        path: &str,
        ctx: &BuildContext,
    ) -> Result<(Self, Option<Value>), FormError> {
        let parsed = load_options(parse_config(config, path)?, ctx);
        let mut mapping = OptionMapping::from_config(config, path)?;
        // a Select returns the matched key unless told otherwise
        if config.get("mappingReturn").is_none() {
            mapping.mapping_return = Some(mapping.mapping_value.clone());
        }
        let initial = parsed.value.or(parsed.default_value.clone());
        let mut state = Self {
            options: parsed.options,
            options_url: parsed.options_url,
            cache_options_url: parsed.cache_options_url,
            default_label: parsed.default_label,
            default_value: parsed.default_value,
            value: None,
            mapping,
            option_ids: Vec::new(),
            ids_to_index: FxHashMap::default(),
        };
        state.rebuild_ids();
        Ok((state, initial))
    }

    fn rebuild_ids(&mut self) {
        self.option_ids = (0..self.options.len())
            .map(|_| format_compact!("select_option_{}", next_uid()))
            .collect();
        self.ids_to_index = self
            .option_ids
            .iter()
            .enumerate()
            .map(|(index, id)| (id.clone(), index))
            .collect();
    }

    /// Stable render key of the option at `index`.
    pub fn option_id(&self, index: usize) -> Option<&str> {
        self.option_ids.get(index).map(CompactString::as_str)
    }

    /// Option looked up by its render key.
    pub fn option_by_id(&self, id: &str) -> Option<&Value> {
        self.ids_to_index.get(id).and_then(|&index| self.options.get(index))
    }

    pub(crate) fn inject(&mut self, provided: &Value) {
        self.value =
            mapping::find_match(&self.options, provided, &self.mapping.mapping_value).cloned();
        if self.value.is_none() && self.default_label.is_none() {
            self.value = self.options.first().cloned();
        }
    }

    pub(crate) fn set(&mut self, value: &Value) {
        self.value = if value.is_null() { None } else { Some(value.clone()) };
    }

    /// Replace the option list, regenerating render keys. The caller is
    /// expected to re-inject the stashed value afterwards.
    pub(crate) fn update_options(&mut self, data: &Value) {
        self.options = as_array(data);
        self.rebuild_ids();
    }

    pub(crate) fn raw_value(&self) -> Value {
        self.value.clone().unwrap_or(Value::Null)
    }

    pub(crate) fn default_value_json(&self) -> Value {
        self.default_value.clone().unwrap_or(Value::Null)
    }
}

/// State of a multi-choice `DropdownSelect` or `GroupSelect` field.
///
/// Holds the matched options in selection order. Injected entries that
/// match no option are dropped.
#[derive(Debug, Clone)]
pub struct OptionListState {
    pub options: Vec<Value>,
    pub options_url: Option<String>,
    pub cache_options_url: bool,
    pub max: Option<usize>,
    pub value: Vec<Value>,
    pub default_value: Option<Value>,
    pub(crate) mapping: OptionMapping,
}

impl OptionListState {
    pub(crate) fn build(
        config: &Value,
        path: &str,
        ctx: &BuildContext,
    ) -> Result<(Self, Option<Value>), FormError> {
        let parsed = load_options(parse_config(config, path)?, ctx);
        let initial = parsed.value.or(parsed.default_value.clone());
        let state = Self {
            options: parsed.options,
            options_url: parsed.options_url,
            cache_options_url: parsed.cache_options_url,
            max: parsed.max,
            value: Vec::new(),
            default_value: parsed.default_value,
            mapping: OptionMapping::from_config(config, path)?,
        };
        Ok((state, initial))
    }

    fn at_capacity(&self) -> bool {
        self.max.is_some_and(|max| self.value.len() >= max)
    }

    pub(crate) fn inject(&mut self, provided: &Value) {
        self.value.clear();
        for item in as_array(provided) {
            if self.at_capacity() {
                break;
            }
            if let Some(option) =
                mapping::find_match(&self.options, &item, &self.mapping.mapping_value)
            {
                if !self.value.contains(option) {
                    self.value.push(option.clone());
                }
            }
        }
    }

    pub(crate) fn set(&mut self, value: &Value) {
        self.value = as_array(value);
        if let Some(max) = self.max {
            self.value.truncate(max);
        }
    }

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

    pub(crate) fn update_options(&mut self, data: &Value) {
        self.options = as_array(data);
    }

    pub(crate) fn raw_value(&self) -> Value {
        Value::Array(self.value.clone())
    }

    pub(crate) fn default_value_json(&self) -> Value {
        self.default_value.clone().unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn ctx() -> BuildContext {
        BuildContext {
            cache: Arc::new(crate::options::OptionsCache::new()),
        }
    }

    fn country_options() -> Value {
        json!({
            "options": [
                {"value": "fr", "label": "France"},
                {"value": "us", "label": "United States"},
                {"value": "uk", "label": "United Kingdom"},
            ]
        })
    }

    #[test]
    fn test_select_matches_and_falls_back() {
        let (mut state, _) = SelectState::build(&country_options(), "/country", &ctx()).unwrap();
        state.inject(&json!("us"));
        assert_eq!(state.value.as_ref().unwrap()["label"], "United States");

        // no match, no defaultLabel: first option wins
        state.inject(&json!("xx"));
        assert_eq!(state.value.as_ref().unwrap()["value"], "fr");
    }

    #[test]
    fn test_select_default_label_suppresses_fallback() {
        let mut config = country_options();
        config["defaultLabel"] = json!("choose one");
        let (mut state, _) = SelectState::build(&config, "/country", &ctx()).unwrap();
        state.inject(&json!("xx"));
        assert!(state.value.is_none());
    }

    #[test]
    fn test_select_cached_url_skips_fetch() {
        let ctx = ctx();
        ctx.cache.insert("https://api/countries", json!([{"value": "de"}]));
        let config = json!({"optionsUrl": "https://api/countries", "cacheOptionsUrl": true});
        let (state, _) = SelectState::build(&config, "/country", &ctx).unwrap();
        assert_eq!(state.options, vec![json!({"value": "de"})]);
        assert!(state.options_url.is_none());
    }

    #[test]
    fn test_option_list_mixed_shapes_resolve() {
        let (mut state, _) =
            OptionListState::build(&country_options(), "/countries", &ctx()).unwrap();
        state.inject(&json!(["fr", {"value": "us"}, "uk"]));
        let picked: Vec<_> = state.value.iter().map(|o| o["value"].clone()).collect();
        assert_eq!(picked, [json!("fr"), json!("us"), json!("uk")]);

        // unmatched entries are dropped
        state.inject(&json!(["fr", "nope"]));
        assert_eq!(state.value.len(), 1);
    }

    #[test]
    fn test_option_list_respects_max() {
        let mut config = country_options();
        config["max"] = json!(2);
        let (mut state, _) = OptionListState::build(&config, "/countries", &ctx()).unwrap();
        state.inject(&json!(["fr", "us", "uk"]));
        assert_eq!(state.value.len(), 2);
        assert!(!state.add(json!({"value": "uk"}), None));
    }
}
