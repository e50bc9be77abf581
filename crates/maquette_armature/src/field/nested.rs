//! The `Nested` field: a repeatable group of child fields.
//!
//! The declaration carries a `fields` template; each instance is a fresh
//! field map built from that template. Cardinality is enforced here:
//! additions refuse to grow past `max`, removals refuse to shrink below
//! `min`, and injection pads the instance list up to `min`.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use maquette_carton::child_path;

use crate::error::FormError;
use crate::field::{
    build_field_map, collect_values, inject_into, parse_config, BuildContext, FieldMap,
};
use crate::value::as_array;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct NestedConfig {
    value: Option<Value>,
    default_value: Option<Value>,
    min: usize,
    max: usize,
    fields: Value,
}

impl Default for NestedConfig {
    fn default() -> Self {
        Self {
            value: None,
            default_value: None,
            min: 1,
            max: 1,
            fields: Value::Null,
        }
    }
}

/// State of a `Nested` field.
#[derive(Debug)]
pub struct NestedState {
    template: Value,
    pub value: Vec<FieldMap>,
    pub min: usize,
    pub max: usize,
    pub default_value: Option<Value>,
}

impl NestedState {
    pub(crate) fn build(config: &Value, path: &str) -> Result<(Self, Option<Value>), FormError> {
        let parsed: NestedConfig = parse_config(config, path)?;
        let initial = parsed
            .value
            .or(parsed.default_value.clone())
            .or(Some(Value::Array(Vec::new())));
        let state = Self {
            template: parsed.fields,
            value: Vec::new(),
            min: parsed.min,
            max: parsed.max,
            default_value: parsed.default_value,
        };
        Ok((state, initial))
    }

    fn instance_for(&self, path: &str, index: usize, ctx: &BuildContext) -> Result<FieldMap, FormError> {
        build_field_map(&self.template, &child_path(path, &index.to_string()), ctx)
    }

    /// Re-resolve the instance list from a provided array of value maps.
    /// Non-object entries are skipped, entries past `max` are dropped, and
    /// the list is padded with pristine instances up to `min`.
    pub(crate) fn inject(&mut self, provided: &Value, path: &str, ctx: &BuildContext) -> Result<(), FormError> {
        self.value.clear();
        for item in as_array(provided) {
            if self.value.len() >= self.max {
                break;
            }
            if !item.is_object() {
                if !item.is_null() {
                    warn!(%path, "skipping non-object nested instance value");
                }
                continue;
            }
            let mut instance = self.instance_for(path, self.value.len(), ctx)?;
            inject_into(&mut instance, &item, true, ctx)?;
            self.value.push(instance);
        }
        while self.value.len() < self.min {
            let instance = self.instance_for(path, self.value.len(), ctx)?;
            self.value.push(instance);
        }
        Ok(())
    }

    /// Append a pristine instance. Refuses past `max`.
    pub(crate) fn add_instance(&mut self, path: &str, ctx: &BuildContext) -> Result<bool, FormError> {
        if self.value.len() >= self.max {
            return Ok(false);
        }
        let instance = self.instance_for(path, self.value.len(), ctx)?;
        self.value.push(instance);
        Ok(true)
    }

    /// Remove the instance at `index`. Refuses below `min`.
    pub(crate) fn remove_instance(&mut self, index: usize, path: &str) -> bool {
        if self.value.len() <= self.min || index >= self.value.len() {
            return false;
        }
        self.value.remove(index);
        self.repath(path);
        true
    }

    /// Move an instance to a new index, recomputing every child path.
    pub(crate) fn move_instance(&mut self, index: usize, new_index: usize, path: &str) -> bool {
        if index >= self.value.len() || new_index >= self.value.len() || index == new_index {
            return false;
        }
        let instance = self.value.remove(index);
        self.value.insert(new_index, instance);
        self.repath(path);
        true
    }

    /// Insert a copy of the instance at `index` right after it. The copy
    /// receives the source's *resolved current data*, not template
    /// defaults, and is fully independent afterwards. Refuses past `max`.
    pub(crate) fn duplicate_instance(
        &mut self,
        index: usize,
        path: &str,
        ctx: &BuildContext,
    ) -> Result<bool, FormError> {
        if self.value.len() >= self.max || index >= self.value.len() {
            return Ok(false);
        }
        let data = collect_values(&self.value[index], false);
        let mut copy = self.instance_for(path, index + 1, ctx)?;
        inject_into(&mut copy, &data, true, ctx)?;
        self.value.insert(index + 1, copy);
        self.repath(path);
        Ok(true)
    }

    /// Recompute the paths of every child after a structural change.
    pub(crate) fn repath(&mut self, path: &str) {
        for (index, instance) in self.value.iter_mut().enumerate() {
            let instance_path = child_path(path, &index.to_string());
            for (name, node) in instance.iter_mut() {
                node.set_path(child_path(&instance_path, name));
            }
        }
    }

    /// Resolved values of every instance, in order.
    pub(crate) fn collect(&self, apply_mapping: bool) -> Value {
        Value::Array(
            self.value
                .iter()
                .map(|instance| collect_values(instance, apply_mapping))
                .collect(),
        )
    }

    pub(crate) fn default_value_json(&self) -> Value {
        self.default_value
            .clone()
            .unwrap_or_else(|| Value::Array(Vec::new()))
    }
}
