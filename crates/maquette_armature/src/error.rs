//! Error types for form construction and field access.

use maquette_carton::path::InvalidSeparator;
use maquette_patina::{RegistryError, RuleParseError};
use thiserror::Error;

/// Errors raised while compiling a form definition or operating on fields.
#[derive(Debug, Error)]
pub enum FormError {
    /// A field declares a type no built-in or registered custom kind matches
    #[error("unknown field type `{kind}` for field `{name}`")]
    UnknownKind { kind: String, name: String },

    /// A field declaration carries no `type` property
    #[error("field `{name}` is missing its `type` property")]
    MissingType { name: String },

    /// A field declaration is structurally invalid
    #[error("invalid configuration at `{path}`: {detail}")]
    InvalidConfig { path: String, detail: String },

    /// A path does not resolve to a field
    #[error("no field at path `{0}`")]
    UnknownPath(String),

    /// The field at a path does not support the requested operation
    #[error("field at `{path}` is not a {expected} field")]
    KindMismatch { path: String, expected: &'static str },

    /// A custom field kind collides with a built-in or an existing kind
    #[error("field kind `{0}` is already registered")]
    DuplicateKind(String),

    #[error(transparent)]
    Rules(#[from] RuleParseError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Separator(#[from] InvalidSeparator),
}

impl FormError {
    pub(crate) fn unknown_path(path: &str) -> Self {
        FormError::UnknownPath(path.to_string())
    }
}
