//! The `TreeSelect` field: selection of nodes out of a tree structure.
//!
//! The tree is held in an arena: every node gets a stable id, a parent
//! link and its payload with the children key stripped. Provided values
//! are matched depth-first, siblings before descent, stopping at the
//! first hit. Selected values can be presented grouped, by an absolute
//! depth (`groupByLevel`) and/or by explicit ancestor nodes
//! (`groupByNodes`), with values outside every group collected under a
//! residual "other" group.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::FormError;
use crate::field::{parse_config, BuildContext};
use crate::mapping::{matches_option, MappingKeys, OptionMapping};
use crate::value::as_array;

/// Stable handle of a node inside a [`TreeData`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeNodeId(u32);

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: TreeNodeId,
    /// The node object with the children key removed
    pub payload: Value,
    pub children: Vec<TreeNodeId>,
    pub parent: Option<TreeNodeId>,
}

/// Arena-backed tree built from nested JSON objects.
#[derive(Debug, Clone, Default)]
pub struct TreeData {
    nodes: Vec<TreeNode>,
    roots: Vec<TreeNodeId>,
}

impl TreeData {
    /// Build an arena from a root object (or an array of root objects).
    /// `children_key` names the property holding a node's children.
    pub fn from_json(data: &Value, children_key: &str) -> Self {
        let mut tree = Self::default();
        match data {
            Value::Array(items) => {
                for item in items {
                    if let Some(id) = tree.add(item, None, children_key) {
                        tree.roots.push(id);
                    }
                }
            }
            Value::Object(_) => {
                if let Some(id) = tree.add(data, None, children_key) {
                    tree.roots.push(id);
                }
            }
            _ => {}
        }
        debug!(nodes = tree.nodes.len(), "built tree arena");
        tree
    }

    fn add(&mut self, value: &Value, parent: Option<TreeNodeId>, children_key: &str) -> Option<TreeNodeId> {
        let object = value.as_object()?;
        let id = TreeNodeId(self.nodes.len() as u32);
        let mut payload = object.clone();
        payload.remove(children_key);
        self.nodes.push(TreeNode {
            id,
            payload: Value::Object(payload),
            children: Vec::new(),
            parent,
        });
        if let Some(Value::Array(children)) = object.get(children_key) {
            for child in children {
                if let Some(child_id) = self.add(child, Some(id), children_key) {
                    self.nodes[id.0 as usize].children.push(child_id);
                }
            }
        }
        Some(id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: TreeNodeId) -> &TreeNode {
        &self.nodes[id.0 as usize]
    }

    pub fn roots(&self) -> &[TreeNodeId] {
        &self.roots
    }

    /// Depth-first first match: a whole sibling list is scanned before any
    /// of its subtrees is descended into.
    pub fn find_match(&self, provided: &Value, keys: &MappingKeys) -> Option<TreeNodeId> {
        self.find_in(&self.roots, provided, keys)
    }

    fn find_in(&self, list: &[TreeNodeId], provided: &Value, keys: &MappingKeys) -> Option<TreeNodeId> {
        for &id in list {
            if matches_option(&self.node(id).payload, provided, keys) {
                return Some(id);
            }
        }
        for &id in list {
            if let Some(found) = self.find_in(&self.node(id).children, provided, keys) {
                return Some(found);
            }
        }
        None
    }

    /// The root-to-node path, the node itself included.
    pub fn path_of(&self, id: TreeNodeId) -> Vec<TreeNodeId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// All nodes at an absolute depth; roots sit at level 0.
    pub fn nodes_at_level(&self, level: usize) -> Vec<TreeNodeId> {
        let mut result = Vec::new();
        self.seek_level(&self.roots, 0, level, &mut result);
        result
    }

    fn seek_level(&self, list: &[TreeNodeId], current: usize, level: usize, out: &mut Vec<TreeNodeId>) {
        if current == level {
            out.extend_from_slice(list);
        } else if level > current {
            for &id in list {
                self.seek_level(&self.node(id).children, current + 1, level, out);
            }
        }
    }
}

/// How a displayed value group is keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeGroupKey {
    /// Grouped under an actual tree node (ancestor-or-self of its members)
    Node(TreeNodeId),
    /// The residual group for values matching no configured group
    Other,
}

/// One display group of selected values.
#[derive(Debug, Clone)]
pub struct TreeGroup {
    pub key: TreeGroupKey,
    pub label: String,
    pub members: Vec<TreeNodeId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TreeConfig {
    value: Option<Value>,
    default_value: Option<Value>,
    data: Option<Value>,
    data_url: Option<String>,
    cache_data_url: bool,
    mapping_children: Option<String>,
    max: Option<usize>,
    group_by_nodes: Vec<Value>,
    group_by_level: Option<usize>,
    other_group_label: Option<String>,
}

/// State of a `TreeSelect` field.
#[derive(Debug, Clone)]
pub struct TreeSelectState {
    pub data: TreeData,
    pub data_url: Option<String>,
    pub cache_data_url: bool,
    pub children_key: String,
    pub max: Option<usize>,
    pub group_by_nodes: Vec<Value>,
    pub group_by_level: Option<usize>,
    pub other_group_label: String,
    pub value: Vec<TreeNodeId>,
    pub default_value: Option<Value>,
    pub(crate) mapping: OptionMapping,
}

impl TreeSelectState {
    pub(crate) fn build(
        config: &Value,
        path: &str,
        ctx: &BuildContext,
    ) -> Result<(Self, Option<Value>), FormError> {
        let mut parsed: TreeConfig = parse_config(config, path)?;
        // cached URL data replaces the URL entirely, skipping the fetch
        if parsed.cache_data_url {
            if let Some(url) = &parsed.data_url {
                if let Some(data) = ctx.cache.get(url) {
                    parsed.data = Some(data);
                    parsed.data_url = None;
                }
            }
        }
        let children_key = parsed.mapping_children.unwrap_or_else(|| "children".to_string());
        let data = parsed
            .data
            .map(|d| TreeData::from_json(&d, &children_key))
            .unwrap_or_default();
        let initial = parsed.value.or(parsed.default_value.clone());
        let state = Self {
            data,
            data_url: parsed.data_url,
            cache_data_url: parsed.cache_data_url,
            children_key,
            max: parsed.max,
            group_by_nodes: parsed.group_by_nodes,
            group_by_level: parsed.group_by_level,
            other_group_label: parsed
                .other_group_label
                .unwrap_or_else(|| "Other values".to_string()),
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
            if item.is_null() || self.at_capacity() {
                continue;
            }
            if let Some(id) = self.data.find_match(&item, &self.mapping.mapping_value) {
                if !self.value.contains(&id) {
                    self.value.push(id);
                }
            }
        }
    }

    pub(crate) fn set(&mut self, value: &Value) {
        self.inject(value);
    }

    /// Select a node directly by id.
    pub fn add_node(&mut self, id: TreeNodeId) -> bool {
        if self.at_capacity() || self.value.contains(&id) {
            return false;
        }
        self.value.push(id);
        true
    }

    pub fn remove_node(&mut self, id: TreeNodeId) -> bool {
        let before = self.value.len();
        self.value.retain(|&v| v != id);
        before != self.value.len()
    }

    pub(crate) fn add(&mut self, value: &Value) -> bool {
        match self.data.find_match(value, &self.mapping.mapping_value) {
            Some(id) => self.add_node(id),
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, value: &Value) -> bool {
        match self.data.find_match(value, &self.mapping.mapping_value) {
            Some(id) => self.remove_node(id),
            None => false,
        }
    }

    /// Replace the tree. The caller is expected to re-inject the stashed
    /// provided value afterwards; selected ids from the old arena are void.
    pub(crate) fn update_data(&mut self, data: &Value) {
        self.data = TreeData::from_json(data, &self.children_key);
        self.value.clear();
    }

    pub(crate) fn raw_value(&self) -> Value {
        Value::Array(
            self.value
                .iter()
                .map(|&id| self.data.node(id).payload.clone())
                .collect(),
        )
    }

    pub(crate) fn default_value_json(&self) -> Value {
        self.default_value.clone().unwrap_or(Value::Null)
    }

    /// Whether the configuration asks for a grouped presentation.
    pub fn display_as_grouped(&self) -> bool {
        !self.group_by_nodes.is_empty() || self.group_by_level.is_some()
    }

    fn payload_label(&self, id: TreeNodeId) -> String {
        self.data
            .node(id)
            .payload
            .get(&self.mapping.mapping_label)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Labels of the `groupByNodes` groups, honoring per-entry
    /// `groupLabel` overrides.
    pub fn group_labels(&self) -> Vec<(TreeNodeId, String)> {
        self.group_by_nodes
            .iter()
            .filter_map(|entry| {
                let id = self.data.find_match(entry, &self.mapping.mapping_value)?;
                let label = entry
                    .get("groupLabel")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| self.payload_label(id));
                Some((id, label))
            })
            .collect()
    }

    /// Partition the selected values into display groups.
    ///
    /// A value belongs to a group when the group's node lies on its
    /// root-to-node path (ancestor-or-self). Level groups come first, then
    /// the `groupByNodes` groups; values left over land in the residual
    /// "other" group. A value may appear in several groups.
    pub fn grouped_values(&self) -> Vec<TreeGroup> {
        let mut groups: Vec<TreeGroup> = Vec::new();
        let mut grouped: Vec<TreeNodeId> = Vec::new();

        let paths: Vec<(TreeNodeId, Vec<TreeNodeId>)> = self
            .value
            .iter()
            .map(|&id| (id, self.data.path_of(id)))
            .collect();

        let mut assign = |groups: &mut Vec<TreeGroup>, group_id: TreeNodeId, label: String| {
            for (value_id, path) in &paths {
                if path.contains(&group_id) {
                    let index = groups
                        .iter()
                        .position(|g| g.key == TreeGroupKey::Node(group_id))
                        .unwrap_or_else(|| {
                            groups.push(TreeGroup {
                                key: TreeGroupKey::Node(group_id),
                                label: label.clone(),
                                members: Vec::new(),
                            });
                            groups.len() - 1
                        });
                    let group = &mut groups[index];
                    if !group.members.contains(value_id) {
                        group.members.push(*value_id);
                    }
                    if !grouped.contains(value_id) {
                        grouped.push(*value_id);
                    }
                }
            }
        };

        if let Some(level) = self.group_by_level {
            for group_id in self.data.nodes_at_level(level) {
                let label = self.payload_label(group_id);
                assign(&mut groups, group_id, label);
            }
        }

        for (group_id, label) in self.group_labels() {
            assign(&mut groups, group_id, label);
        }

        if grouped.len() < self.value.len() {
            let members = self
                .value
                .iter()
                .copied()
                .filter(|id| !grouped.contains(id))
                .collect();
            groups.push(TreeGroup {
                key: TreeGroupKey::Other,
                label: self.other_group_label.clone(),
                members,
            });
        }

        groups
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

    fn taxonomy() -> Value {
        json!({
            "value": "life", "label": "Life",
            "children": [
                {"value": "animal", "label": "Animal", "children": [
                    {"value": "cat", "label": "Cat"},
                    {"value": "dog", "label": "Dog"},
                ]},
                {"value": "plant", "label": "Plant", "children": [
                    {"value": "oak", "label": "Oak"},
                ]},
            ]
        })
    }

    fn build(config: Value) -> TreeSelectState {
        let mut full = config;
        full["data"] = taxonomy();
        TreeSelectState::build(&full, "/taxonomy", &ctx()).unwrap().0
    }

    #[test]
    fn test_find_match_scans_siblings_before_descending() {
        let data = TreeData::from_json(
            &json!({"value": "a", "children": [
                {"value": "x", "children": [{"value": "deep"}]},
                {"value": "deep"},
            ]}),
            "children",
        );
        let hit = data.find_match(&json!("deep"), &MappingKeys::default()).unwrap();
        // the level-1 "deep" wins over the level-2 one
        assert_eq!(data.path_of(hit).len(), 2);
    }

    #[test]
    fn test_inject_matches_and_strips_children() {
        let mut state = build(json!({}));
        state.inject(&json!(["cat", "plant"]));
        let out = state.raw_value();
        assert_eq!(out[0]["value"], "cat");
        assert_eq!(out[1]["value"], "plant");
        assert!(out[1].get("children").is_none());
    }

    #[test]
    fn test_node_path() {
        let state = build(json!({}));
        let cat = state.data.find_match(&json!("cat"), &MappingKeys::default()).unwrap();
        let labels: Vec<_> = state
            .data
            .path_of(cat)
            .iter()
            .map(|&id| state.data.node(id).payload["value"].clone())
            .collect();
        assert_eq!(labels, [json!("life"), json!("animal"), json!("cat")]);
    }

    #[test]
    fn test_grouped_by_level_with_residual() {
        let mut state = build(json!({"groupByLevel": 1}));
        // "life" itself fits under no level-1 group
        state.inject(&json!(["cat", "oak", "life"]));
        let groups = state.grouped_values();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].label, "Animal");
        assert_eq!(groups[1].label, "Plant");
        assert_eq!(groups[2].label, "Other values");
        assert_eq!(groups[2].members.len(), 1);
    }

    #[test]
    fn test_group_by_nodes_label_override() {
        let mut state = build(json!({
            "groupByNodes": [{"value": "animal", "groupLabel": "Fauna"}]
        }));
        state.inject(&json!(["cat", "dog"]));
        let groups = state.grouped_values();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, "Fauna");
        assert_eq!(groups[0].members.len(), 2);
    }

    #[test]
    fn test_max_caps_selection() {
        let mut state = build(json!({"max": 1}));
        state.inject(&json!(["cat", "dog"]));
        assert_eq!(state.value.len(), 1);
        assert!(!state.add(&json!("dog")));
    }
}
