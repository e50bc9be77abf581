//! Error types for maquette_patina.

use thiserror::Error;

/// Errors raised while parsing a validation rule declaration.
#[derive(Debug, Error)]
pub enum RuleParseError {
    /// A rule token was empty (e.g. `"required||min:3"`)
    #[error("empty validation rule token")]
    EmptyToken,

    /// A `regex:` rule carried an invalid pattern
    #[error("invalid regex rule `{pattern}`")]
    InvalidRegex {
        /// The offending pattern
        pattern: String,
        /// The underlying regex error
        #[source]
        source: regex::Error,
    },

    /// A `regex:` rule carried a flag the engine does not support
    #[error("unsupported regex flag `{0}`")]
    UnsupportedFlag(char),

    /// The declaration was neither a string nor an array of strings
    #[error("validation rules must be a string or an array of strings")]
    InvalidShape,
}

/// Errors raised while registering a custom validation function.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Custom rules must carry an error message
    #[error("custom rule `{0}` requires a non-empty error message")]
    EmptyMessage(String),

    /// Custom rules must carry a name
    #[error("custom rule name must not be empty")]
    EmptyName,
}
