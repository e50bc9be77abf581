//! # maquette_armature
//!
//! Armature - The field-node tree and form store for Maquette.
//!
//! ## Name Origin
//!
//! **Armature** (/ˈɑːrmətʃər/) is the rigid internal skeleton a sculptor
//! builds a maquette around. `maquette_armature` is the skeleton of a form:
//! the tree of field nodes everything else — values, validation, options —
//! hangs on.
//!
//! ## Overview
//!
//! A form is declared as plain JSON: a `fields` object mapping names to
//! field declarations, each carrying a `type` and kind-specific
//! configuration. [`FormState::new`] compiles the declaration once into an
//! ordered tree of [`field::FieldNode`]s; everything after that is explicit
//! operations on the store — inject values, read values (with or without
//! output mapping), mutate repeatable containers, validate, resolve remote
//! option data.
//!
//! Fields are addressed by slash paths (`/people/0/firstname`) alternating
//! field names and instance indices of repeatable `Nested` containers.
//! Every node keeps the raw value last provided to it, so option-backed
//! fields can re-resolve their selection when option data arrives after
//! injection.

pub mod error;
pub mod field;
pub mod mapping;
pub mod options;
pub mod store;

mod value;

pub use error::FormError;
pub use field::{
    register_custom_field, BoolState, BuildContext, CellEdit, CustomField, CustomFieldFactory,
    DataSheetState, FieldBase, FieldBody, FieldId, FieldMap, FieldNode, GenericState, GridEdit,
    InputType, NestedState, OptionListState, SelectState, SheetHeader, SheetRow, SliderState,
    SliderValue, TextMultipleState, TextState, TreeData, TreeGroup, TreeGroupKey, TreeNode,
    TreeNodeId, TreeSelectState, ValidationEvent, ValidationOptions, ValidationState,
};
pub use mapping::{MappingKeys, OptionMapping};
pub use options::{
    prefetch_options, FetchError, FetchStatus, FnFetcher, OptionsCache, OptionsFetcher,
};
pub use store::FormState;

pub use maquette_carton::{
    path_separator as path_node_separator, set_path_separator as set_path_node_separator,
    sibling_path,
};
