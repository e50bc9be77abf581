//! Field nodes.
//!
//! A field is the pair of a [`FieldBase`] (the configuration and state every
//! kind shares) and a [`FieldBody`] (the kind-specific state). Field maps
//! preserve declaration order; nested fields own further field maps, one per
//! instance.
//!
//! Every node stashes the raw value last provided to it. `inject_value`
//! re-invoked with `None` re-resolves that stash, which is how late-arriving
//! option data gets matched without the caller keeping the original value
//! around.

pub mod boolean;
pub mod custom;
pub mod generic;
pub mod nested;
pub mod select;
pub mod sheet;
pub mod slider;
pub mod text;
pub mod tree;

use std::sync::Arc;

use compact_str::CompactString;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use maquette_carton::{child_path, next_uid};
use maquette_patina::{RuleSet, ValidationOutcome};

use crate::error::FormError;
use crate::mapping::{map_return_value, OptionMapping};
use crate::options::OptionsCache;

pub use boolean::BoolState;
pub use custom::{register_custom_field, CustomField, CustomFieldFactory};
pub use generic::GenericState;
pub use nested::NestedState;
pub use select::{OptionListState, SelectState};
pub use sheet::{CellEdit, DataSheetState, GridEdit, SheetHeader, SheetRow};
pub use slider::{SliderState, SliderValue};
pub use text::{InputType, TextMultipleState, TextState};
pub use tree::{TreeData, TreeGroup, TreeGroupKey, TreeNode, TreeNodeId, TreeSelectState};

/// Ordered map of field name to node; declaration order is observable.
pub type FieldMap = IndexMap<String, FieldNode>;

/// Stable identity of a node, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(u64);

impl FieldId {
    fn next() -> Self {
        Self(next_uid())
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Result of the last validation run over a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    Success,
    Error,
}

/// The editing event that triggered a validation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationEvent {
    Blur,
    Change,
    Submit,
}

/// When a field wants to be validated.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationOptions {
    pub on_blur: bool,
    pub on_change: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            on_blur: true,
            on_change: false,
        }
    }
}

/// Shared context threaded through field construction and injection:
/// nested instances build child fields, option kinds consult the cache.
#[derive(Clone)]
pub struct BuildContext {
    pub(crate) cache: Arc<OptionsCache>,
}

impl BuildContext {
    pub fn new(cache: Arc<OptionsCache>) -> Self {
        Self { cache }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BaseConfig {
    label: Option<String>,
    label_tooltip: Option<String>,
    placeholder: Option<String>,
    empty_to_null: Option<bool>,
    disabled: bool,
    read_only: bool,
    read_and_delete_only: bool,
    read_mode: bool,
    validation_rules: Value,
    custom_error_messages: FxHashMap<String, String>,
    validation_options: ValidationOptions,
}

/// Deserialize a declaration into a configuration struct. Malformed
/// declarations are fatal, never silently replaced by defaults.
pub(crate) fn parse_config<T>(config: &Value, path: &str) -> Result<T, FormError>
where
    T: serde::de::DeserializeOwned,
{
    T::deserialize(config).map_err(|err| FormError::InvalidConfig {
        path: path.to_string(),
        detail: err.to_string(),
    })
}

/// Configuration and state common to every field kind.
#[derive(Debug)]
pub struct FieldBase {
    pub id: FieldId,
    /// The `type` string the field was declared with
    pub kind: CompactString,
    /// The declaration key, used as the label fallback
    pub name: CompactString,
    pub label: Option<String>,
    pub label_tooltip: Option<String>,
    pub placeholder: Option<String>,
    pub path: String,
    pub empty_to_null: bool,
    pub disabled: bool,
    pub read_only: bool,
    pub read_and_delete_only: bool,
    pub read_mode: bool,
    pub validation_rules: RuleSet,
    pub custom_error_messages: FxHashMap<String, String>,
    pub validation_options: ValidationOptions,
    pub validation_state: Option<ValidationState>,
    pub validation_errors: Vec<String>,
    pub(crate) provided_value: Option<Value>,
    pub(crate) validation_epoch: u64,
    revision: u64,
}

impl FieldBase {
    fn from_config(
        name: &str,
        path: &str,
        kind: &str,
        config: &Value,
        empty_to_null_default: bool,
    ) -> Result<Self, FormError> {
        let parsed: BaseConfig = parse_config(config, path)?;
        Ok(Self {
            id: FieldId::next(),
            kind: CompactString::new(kind),
            name: CompactString::new(name),
            label: parsed.label,
            label_tooltip: parsed.label_tooltip,
            placeholder: parsed.placeholder,
            path: path.to_string(),
            empty_to_null: parsed.empty_to_null.unwrap_or(empty_to_null_default),
            disabled: parsed.disabled,
            read_only: parsed.read_only,
            read_and_delete_only: parsed.read_and_delete_only,
            read_mode: parsed.read_mode,
            validation_rules: RuleSet::parse(&parsed.validation_rules)?,
            custom_error_messages: parsed.custom_error_messages,
            validation_options: parsed.validation_options,
            validation_state: None,
            validation_errors: Vec::new(),
            provided_value: None,
            validation_epoch: 0,
            revision: 0,
        })
    }

    /// The label, falling back to the declaration key.
    pub fn label_or_name(&self) -> &str {
        self.label.as_deref().unwrap_or(self.name.as_str())
    }

    /// Change counter, bumped on every state mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn touch(&mut self) {
        self.revision += 1;
    }

    /// The raw value last provided to the field, if any.
    pub fn provided_value(&self) -> Option<&Value> {
        self.provided_value.as_ref()
    }

    pub(crate) fn clear_validation(&mut self) {
        self.validation_state = None;
        self.validation_errors.clear();
    }

    /// Whether the field asks to be validated on this event.
    pub fn should_validate_on(&self, event: ValidationEvent) -> bool {
        match event {
            ValidationEvent::Blur => self.validation_options.on_blur,
            ValidationEvent::Change => self.validation_options.on_change,
            ValidationEvent::Submit => true,
        }
    }
}

/// Kind-specific field state.
#[derive(Debug)]
pub enum FieldBody {
    Text(TextState),
    TextArea(TextState),
    TextMultiple(TextMultipleState),
    CheckBox(BoolState),
    Toggle(BoolState),
    Select(SelectState),
    DropdownSelect(OptionListState),
    GroupSelect(OptionListState),
    TreeSelect(TreeSelectState),
    Nested(NestedState),
    DataSheet(DataSheetState),
    Slider(SliderState),
    Generic(GenericState),
    Custom(Box<dyn CustomField>),
}

/// Work item for an in-flight validation pass.
#[derive(Debug)]
pub(crate) struct PendingValidation {
    pub path: String,
    pub label: String,
    pub value: Value,
    pub rules: RuleSet,
    pub messages: FxHashMap<String, String>,
    pub epoch: u64,
}

/// One field of a form: shared base plus kind-specific body.
#[derive(Debug)]
pub struct FieldNode {
    pub base: FieldBase,
    pub body: FieldBody,
}

static PLAIN_MAPPING: Lazy<OptionMapping> = Lazy::new(OptionMapping::default);

impl FieldNode {
    /// Build a node from its declaration. The initial value (declared
    /// `value`, falling back to `defaultValue`) is injected as part of
    /// construction.
    pub(crate) fn build(
        name: &str,
        config: &Value,
        path: &str,
        ctx: &BuildContext,
    ) -> Result<Self, FormError> {
        if !config.is_object() {
            return Err(FormError::InvalidConfig {
                path: path.to_string(),
                detail: format!("declaration of field `{name}` must be an object"),
            });
        }
        let kind = config
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| FormError::MissingType {
                name: name.to_string(),
            })?;

        let (body, initial, empty_to_null_default) = match kind {
            "InputText" | "Text" => {
                let (state, initial) = TextState::build(config, path)?;
                (FieldBody::Text(state), initial, true)
            }
            "TextArea" => {
                let (state, initial) = TextState::build(config, path)?;
                (FieldBody::TextArea(state), initial, true)
            }
            "InputTextMultiple" | "TextMultiple" => {
                let (state, initial) = TextMultipleState::build(config, path)?;
                (FieldBody::TextMultiple(state), initial, false)
            }
            "CheckBox" => {
                let (state, initial) = BoolState::build(config, path)?;
                (FieldBody::CheckBox(state), initial, false)
            }
            "Toggle" => {
                let (state, initial) = BoolState::build(config, path)?;
                (FieldBody::Toggle(state), initial, false)
            }
            "Select" => {
                let (state, initial) = SelectState::build(config, path, ctx)?;
                (FieldBody::Select(state), initial, true)
            }
            "DropdownSelect" => {
                let (state, initial) = OptionListState::build(config, path, ctx)?;
                (FieldBody::DropdownSelect(state), initial, false)
            }
            "GroupSelect" => {
                let (state, initial) = OptionListState::build(config, path, ctx)?;
                (FieldBody::GroupSelect(state), initial, false)
            }
            "TreeSelect" => {
                let (state, initial) = TreeSelectState::build(config, path, ctx)?;
                (FieldBody::TreeSelect(state), initial, false)
            }
            "Nested" => {
                let (state, initial) = NestedState::build(config, path)?;
                (FieldBody::Nested(state), initial, false)
            }
            "DataSheet" => {
                let (state, initial) = DataSheetState::build(config, path)?;
                (FieldBody::DataSheet(state), initial, false)
            }
            "Slider" => {
                let (state, initial) = SliderState::build(config, path)?;
                (FieldBody::Slider(state), initial, false)
            }
            "Default" => {
                let (state, initial) = GenericState::build(config, path)?;
                (FieldBody::Generic(state), initial, false)
            }
            other => match custom::lookup(other) {
                Some(factory) => {
                    let body = factory(config)?;
                    let initial = config
                        .get("value")
                        .cloned()
                        .or_else(|| config.get("defaultValue").cloned());
                    (FieldBody::Custom(body), initial, false)
                }
                None => {
                    return Err(FormError::UnknownKind {
                        kind: other.to_string(),
                        name: name.to_string(),
                    })
                }
            },
        };

        let base = FieldBase::from_config(name, path, kind, config, empty_to_null_default)?;
        let mut node = Self { base, body };
        if let Some(initial) = initial {
            node.inject_value(Some(&initial), ctx)?;
        }
        Ok(node)
    }

    /// The `type` string the field was declared with.
    pub fn kind(&self) -> &str {
        self.base.kind.as_str()
    }

    /// List-valued kinds stash a scalar provided value as a one-element
    /// array, so re-resolution behaves identically either way.
    fn stash_as_array(&self) -> bool {
        matches!(
            self.body,
            FieldBody::TextMultiple(_)
                | FieldBody::DropdownSelect(_)
                | FieldBody::GroupSelect(_)
                | FieldBody::TreeSelect(_)
                | FieldBody::Nested(_)
                | FieldBody::DataSheet(_)
        )
    }

    /// Provide a value to the field (stashing it raw), or with `None`
    /// re-resolve the previously stashed value — used after option data
    /// arrives late.
    pub fn inject_value(
        &mut self,
        provided: Option<&Value>,
        ctx: &BuildContext,
    ) -> Result<(), FormError> {
        if let Some(value) = provided {
            let stashed = if self.stash_as_array() && !value.is_array() {
                if value.is_null() {
                    Value::Array(Vec::new())
                } else {
                    Value::Array(vec![value.clone()])
                }
            } else {
                value.clone()
            };
            self.base.provided_value = Some(stashed);
        }
        let Some(stashed) = self.base.provided_value.clone() else {
            return Ok(());
        };
        let path = self.base.path.clone();
        match &mut self.body {
            FieldBody::Text(state) | FieldBody::TextArea(state) => state.inject(&stashed),
            FieldBody::TextMultiple(state) => state.inject(&stashed),
            FieldBody::CheckBox(state) | FieldBody::Toggle(state) => state.inject(&stashed),
            FieldBody::Select(state) => state.inject(&stashed),
            FieldBody::DropdownSelect(state) | FieldBody::GroupSelect(state) => {
                state.inject(&stashed)
            }
            FieldBody::TreeSelect(state) => state.inject(&stashed),
            FieldBody::Nested(state) => state.inject(&stashed, &path, ctx)?,
            FieldBody::DataSheet(state) => state.inject(&stashed),
            FieldBody::Slider(state) => state.inject(&stashed),
            FieldBody::Generic(state) => state.inject(&stashed),
            FieldBody::Custom(body) => body.inject(&stashed),
        }
        self.base.touch();
        Ok(())
    }

    /// The field's value. With `apply_mapping` the output transforms run:
    /// `mappingReturn` projection, then `returnSingle` collapse, then
    /// `emptyToNull` collapse.
    pub fn value(&self, apply_mapping: bool) -> Value {
        let (raw, mapping) = match &self.body {
            FieldBody::Text(state) | FieldBody::TextArea(state) => (state.raw_value(), None),
            FieldBody::TextMultiple(state) => (state.raw_value(), None),
            FieldBody::CheckBox(state) | FieldBody::Toggle(state) => (state.raw_value(), None),
            FieldBody::Select(state) => (state.raw_value(), Some(&state.mapping)),
            FieldBody::DropdownSelect(state) | FieldBody::GroupSelect(state) => {
                (state.raw_value(), Some(&state.mapping))
            }
            FieldBody::TreeSelect(state) => (state.raw_value(), Some(&state.mapping)),
            FieldBody::Nested(state) => (state.collect(apply_mapping), None),
            FieldBody::DataSheet(state) => (state.raw_value(), Some(&state.mapping)),
            FieldBody::Slider(state) => (state.raw_value(), None),
            FieldBody::Generic(state) => (state.raw_value(), Some(&state.mapping)),
            FieldBody::Custom(body) => return body.value(apply_mapping),
        };
        if !apply_mapping {
            return raw;
        }
        map_return_value(raw, mapping.unwrap_or(&PLAIN_MAPPING), self.base.empty_to_null)
    }

    /// Direct write from an editing surface. Unlike injection, no stash is
    /// recorded. `Nested` ignores direct writes; use injection or the
    /// instance operations.
    pub fn set_value(&mut self, value: &Value) {
        match &mut self.body {
            FieldBody::Text(state) | FieldBody::TextArea(state) => state.set(value),
            FieldBody::TextMultiple(state) => state.set(value),
            FieldBody::CheckBox(state) | FieldBody::Toggle(state) => state.set(value),
            FieldBody::Select(state) => state.set(value),
            FieldBody::DropdownSelect(state) | FieldBody::GroupSelect(state) => state.set(value),
            FieldBody::TreeSelect(state) => state.set(value),
            FieldBody::Nested(_) => return,
            FieldBody::DataSheet(state) => state.set(value),
            FieldBody::Slider(state) => state.set(value),
            FieldBody::Generic(state) => state.set(value),
            FieldBody::Custom(body) => body.set_value(value),
        }
        self.base.touch();
    }

    /// Append a value to a list-valued field. Duplicates and additions
    /// past the field's `max` are refused. Returns whether the value was
    /// added.
    pub fn add_value(&mut self, value: Value, index: Option<usize>) -> bool {
        let added = match &mut self.body {
            FieldBody::TextMultiple(state) => state.add(value, index),
            FieldBody::DropdownSelect(state) | FieldBody::GroupSelect(state) => {
                state.add(value, index)
            }
            FieldBody::TreeSelect(state) => state.add(&value),
            FieldBody::Generic(state) => state.add(value, index),
            _ => false,
        };
        if added {
            self.base.touch();
        }
        added
    }

    /// Remove every occurrence of a value from a list-valued field.
    /// Returns whether anything was removed.
    pub fn remove_value(&mut self, value: &Value) -> bool {
        let removed = match &mut self.body {
            FieldBody::TextMultiple(state) => state.remove(value),
            FieldBody::DropdownSelect(state) | FieldBody::GroupSelect(state) => {
                state.remove(value)
            }
            FieldBody::TreeSelect(state) => state.remove(value),
            FieldBody::Generic(state) => state.remove(value),
            _ => false,
        };
        if removed {
            self.base.touch();
        }
        removed
    }

    fn default_value_json(&self) -> Value {
        match &self.body {
            FieldBody::Text(state) | FieldBody::TextArea(state) => state.default_value_json(),
            FieldBody::TextMultiple(state) => state.default_value_json(),
            FieldBody::CheckBox(state) | FieldBody::Toggle(state) => state.default_value_json(),
            FieldBody::Select(state) => state.default_value_json(),
            FieldBody::DropdownSelect(state) | FieldBody::GroupSelect(state) => {
                state.default_value_json()
            }
            FieldBody::TreeSelect(state) => state.default_value_json(),
            FieldBody::Nested(state) => state.default_value_json(),
            FieldBody::DataSheet(state) => state.default_value_json(),
            FieldBody::Slider(state) => state.default_value_json(),
            FieldBody::Generic(state) => state.default_value_json(),
            FieldBody::Custom(body) => body.default_value(),
        }
    }

    /// Restore the declared default value and clear validation state.
    pub fn reset(&mut self, ctx: &BuildContext) -> Result<(), FormError> {
        let default = self.default_value_json();
        self.inject_value(Some(&default), ctx)?;
        self.base.clear_validation();
        Ok(())
    }

    /// Re-address the node, cascading into nested instances.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.base.path = path.into();
        let path = self.base.path.clone();
        if let FieldBody::Nested(nested) = &mut self.body {
            nested.repath(&path);
        }
    }

    /// `add_instance` on a `Nested` field; refuses past `max`.
    pub fn add_instance(&mut self, ctx: &BuildContext) -> Result<bool, FormError> {
        let path = self.base.path.clone();
        match &mut self.body {
            FieldBody::Nested(nested) => {
                let added = nested.add_instance(&path, ctx)?;
                if added {
                    self.base.touch();
                }
                Ok(added)
            }
            _ => Err(self.kind_mismatch("Nested")),
        }
    }

    /// `remove_instance` on a `Nested` field; refuses below `min`.
    pub fn remove_instance(&mut self, index: usize) -> Result<bool, FormError> {
        let path = self.base.path.clone();
        match &mut self.body {
            FieldBody::Nested(nested) => {
                let removed = nested.remove_instance(index, &path);
                if removed {
                    self.base.touch();
                }
                Ok(removed)
            }
            _ => Err(self.kind_mismatch("Nested")),
        }
    }

    pub fn move_instance(&mut self, index: usize, new_index: usize) -> Result<bool, FormError> {
        let path = self.base.path.clone();
        match &mut self.body {
            FieldBody::Nested(nested) => {
                let moved = nested.move_instance(index, new_index, &path);
                if moved {
                    self.base.touch();
                }
                Ok(moved)
            }
            _ => Err(self.kind_mismatch("Nested")),
        }
    }

    /// `duplicate_instance` on a `Nested` field: the copy receives the
    /// source's resolved current data.
    pub fn duplicate_instance(
        &mut self,
        index: usize,
        ctx: &BuildContext,
    ) -> Result<bool, FormError> {
        let path = self.base.path.clone();
        match &mut self.body {
            FieldBody::Nested(nested) => {
                let duplicated = nested.duplicate_instance(index, &path, ctx)?;
                if duplicated {
                    self.base.touch();
                }
                Ok(duplicated)
            }
            _ => Err(self.kind_mismatch("Nested")),
        }
    }

    /// Apply a batch of grid edits to a `DataSheet` field.
    pub fn apply_sheet_changes(
        &mut self,
        changes: &[CellEdit],
        out_of_scope: &[GridEdit],
    ) -> Result<(), FormError> {
        match &mut self.body {
            FieldBody::DataSheet(sheet) => {
                sheet.apply_changes(changes, out_of_scope);
                self.base.touch();
                Ok(())
            }
            _ => Err(self.kind_mismatch("DataSheet")),
        }
    }

    pub fn add_row(&mut self, index: Option<usize>) -> Result<bool, FormError> {
        self.with_sheet(|sheet| sheet.add_row(index))
    }

    pub fn remove_row(&mut self, index: usize) -> Result<bool, FormError> {
        self.with_sheet(|sheet| sheet.remove_row(index))
    }

    pub fn move_row(&mut self, index: usize, new_index: usize) -> Result<bool, FormError> {
        self.with_sheet(|sheet| sheet.move_row(index, new_index))
    }

    pub fn duplicate_row(&mut self, index: usize) -> Result<bool, FormError> {
        self.with_sheet(|sheet| sheet.duplicate_row(index))
    }

    fn with_sheet(
        &mut self,
        op: impl FnOnce(&mut DataSheetState) -> bool,
    ) -> Result<bool, FormError> {
        match &mut self.body {
            FieldBody::DataSheet(sheet) => {
                let changed = op(sheet);
                if changed {
                    self.base.touch();
                }
                Ok(changed)
            }
            _ => Err(self.kind_mismatch("DataSheet")),
        }
    }

    /// The remote data source of an option-backed field, if it still has
    /// one to resolve: `(url, cache_through_shared_cell)`.
    pub(crate) fn pending_source(&self) -> Option<(String, bool)> {
        match &self.body {
            FieldBody::Select(state) => state
                .options_url
                .clone()
                .map(|url| (url, state.cache_options_url)),
            FieldBody::DropdownSelect(state) | FieldBody::GroupSelect(state) => state
                .options_url
                .clone()
                .map(|url| (url, state.cache_options_url)),
            FieldBody::TreeSelect(state) => state
                .data_url
                .clone()
                .map(|url| (url, state.cache_data_url)),
            _ => None,
        }
    }

    /// Replace an option-backed field's data and re-resolve the stashed
    /// provided value against it.
    pub(crate) fn apply_remote_data(
        &mut self,
        data: &Value,
        ctx: &BuildContext,
    ) -> Result<(), FormError> {
        match &mut self.body {
            FieldBody::Select(state) => state.update_options(data),
            FieldBody::DropdownSelect(state) | FieldBody::GroupSelect(state) => {
                state.update_options(data)
            }
            FieldBody::TreeSelect(state) => state.update_data(data),
            _ => {
                return Err(self.kind_mismatch("option-backed"));
            }
        }
        debug!(path = %self.base.path, "applied remote option data");
        self.inject_value(None, ctx)
    }

    fn kind_mismatch(&self, expected: &'static str) -> FormError {
        FormError::KindMismatch {
            path: self.base.path.clone(),
            expected,
        }
    }

    /// Start a validation run for this node: bump the epoch and capture
    /// everything the engine needs. `None` when the node has no rules.
    pub(crate) fn begin_validation(&mut self) -> Option<PendingValidation> {
        if self.base.validation_rules.is_empty() {
            return None;
        }
        self.base.validation_epoch += 1;
        Some(PendingValidation {
            path: self.base.path.clone(),
            label: self.base.label_or_name().to_string(),
            value: self.value(true),
            rules: self.base.validation_rules.clone(),
            messages: self.base.custom_error_messages.clone(),
            epoch: self.base.validation_epoch,
        })
    }

    /// Apply a finished validation outcome. Outcomes from a superseded
    /// epoch are discarded.
    pub(crate) fn apply_validation(&mut self, outcome: &ValidationOutcome) {
        if outcome.epoch != self.base.validation_epoch {
            debug!(path = %self.base.path, "discarding stale validation outcome");
            return;
        }
        self.base.validation_state = Some(if outcome.passed {
            ValidationState::Success
        } else {
            ValidationState::Error
        });
        self.base.validation_errors = outcome.errors.clone();
        self.base.touch();
    }

    pub fn as_nested(&self) -> Option<&NestedState> {
        match &self.body {
            FieldBody::Nested(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&TreeSelectState> {
        match &self.body {
            FieldBody::TreeSelect(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_sheet(&self) -> Option<&DataSheetState> {
        match &self.body {
            FieldBody::DataSheet(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_select(&self) -> Option<&SelectState> {
        match &self.body {
            FieldBody::Select(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_option_list(&self) -> Option<&OptionListState> {
        match &self.body {
            FieldBody::DropdownSelect(state) | FieldBody::GroupSelect(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_slider(&self) -> Option<&SliderState> {
        match &self.body {
            FieldBody::Slider(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_slider_mut(&mut self) -> Option<&mut SliderState> {
        match &mut self.body {
            FieldBody::Slider(state) => Some(state),
            _ => None,
        }
    }
}

/// Build an ordered field map from a definition object. A `null` template
/// yields an empty map.
pub(crate) fn build_field_map(
    template: &Value,
    base_path: &str,
    ctx: &BuildContext,
) -> Result<FieldMap, FormError> {
    let mut fields = FieldMap::new();
    let Some(object) = template.as_object() else {
        return Ok(fields);
    };
    for (name, config) in object {
        let path = child_path(base_path, name);
        let node = FieldNode::build(name, config, &path, ctx)?;
        fields.insert(name.clone(), node);
    }
    Ok(fields)
}

/// Resolved values of a field map. Disabled fields are omitted; readOnly
/// and readAndDeleteOnly fields are included.
pub(crate) fn collect_values(fields: &FieldMap, apply_mapping: bool) -> Value {
    let mut out = serde_json::Map::new();
    for (name, node) in fields {
        if node.base.disabled {
            continue;
        }
        out.insert(name.clone(), node.value(apply_mapping));
    }
    Value::Object(out)
}

/// Inject a map of values into a field map. With `merge` false the fields
/// are reset first, so absent keys fall back to their defaults. Keys
/// matching no field are ignored.
pub(crate) fn inject_into(
    fields: &mut FieldMap,
    values: &Value,
    merge: bool,
    ctx: &BuildContext,
) -> Result<(), FormError> {
    if !merge {
        reset_fields(fields, ctx)?;
    }
    let Some(object) = values.as_object() else {
        return Ok(());
    };
    for (key, value) in object {
        match fields.get_mut(key) {
            Some(node) => node.inject_value(Some(value), ctx)?,
            None => debug!(field = %key, "ignoring value for unknown field"),
        }
    }
    Ok(())
}

pub(crate) fn reset_fields(fields: &mut FieldMap, ctx: &BuildContext) -> Result<(), FormError> {
    for node in fields.values_mut() {
        node.reset(ctx)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> BuildContext {
        BuildContext::new(Arc::new(OptionsCache::new()))
    }

    #[test]
    fn test_superseded_validation_outcome_is_discarded() {
        let config = json!({"type": "InputText", "validationRules": "required"});
        let mut node = FieldNode::build("name", &config, "/name", &ctx()).unwrap();

        let first = node.begin_validation().unwrap();
        let second = node.begin_validation().unwrap();
        assert!(second.epoch > first.epoch);

        // an outcome from the superseded dispatch leaves the node untouched
        node.apply_validation(&ValidationOutcome {
            passed: false,
            errors: vec!["The name field is required.".to_string()],
            epoch: first.epoch,
        });
        assert!(node.base.validation_state.is_none());
        assert!(node.base.validation_errors.is_empty());

        node.apply_validation(&ValidationOutcome {
            passed: true,
            errors: Vec::new(),
            epoch: second.epoch,
        });
        assert_eq!(node.base.validation_state, Some(ValidationState::Success));
    }
}
