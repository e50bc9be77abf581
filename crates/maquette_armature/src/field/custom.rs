//! Custom field kinds.
//!
//! Hosts can register new kinds under names of their own; a definition
//! whose `type` names one gets its body built by the registered factory.
//! Built-in kind names cannot be taken over.

use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::FormError;

/// Behavior of a custom field body. Implementations own their state; the
/// surrounding node still carries the common configuration (label, path,
/// validation, flags).
pub trait CustomField: fmt::Debug + Send + Sync {
    /// The `type` string this body was built for.
    fn kind(&self) -> &str;

    /// Resolve a provided value into the field's state.
    fn inject(&mut self, provided: &Value);

    /// Direct write from an editing surface.
    fn set_value(&mut self, value: &Value);

    /// The current value, with or without output mapping applied.
    fn value(&self, apply_mapping: bool) -> Value;

    /// The configured default value.
    fn default_value(&self) -> Value;

    /// Restore the default value.
    fn reset(&mut self) {
        let default = self.default_value();
        self.inject(&default);
    }
}

/// Builds a custom field body from its declaration object.
pub type CustomFieldFactory =
    Arc<dyn Fn(&Value) -> Result<Box<dyn CustomField>, FormError> + Send + Sync>;

static REGISTRY: Lazy<RwLock<FxHashMap<CompactString, CustomFieldFactory>>> =
    Lazy::new(|| RwLock::new(FxHashMap::default()));

pub(crate) const BUILTIN_KINDS: &[&str] = &[
    "InputText",
    "Text",
    "TextArea",
    "InputTextMultiple",
    "TextMultiple",
    "CheckBox",
    "Toggle",
    "Select",
    "DropdownSelect",
    "GroupSelect",
    "TreeSelect",
    "Nested",
    "DataSheet",
    "Slider",
    "Default",
];

pub(crate) fn is_builtin_kind(kind: &str) -> bool {
    BUILTIN_KINDS.contains(&kind)
}

/// Register a custom field kind. Colliding with a built-in kind or an
/// already registered custom kind is an error.
pub fn register_custom_field(kind: &str, factory: CustomFieldFactory) -> Result<(), FormError> {
    if is_builtin_kind(kind) {
        return Err(FormError::DuplicateKind(kind.to_string()));
    }
    let mut registry = REGISTRY.write();
    if registry.contains_key(kind) {
        return Err(FormError::DuplicateKind(kind.to_string()));
    }
    registry.insert(CompactString::new(kind), factory);
    Ok(())
}

pub(crate) fn lookup(kind: &str) -> Option<CustomFieldFactory> {
    REGISTRY.read().get(kind).cloned()
}
