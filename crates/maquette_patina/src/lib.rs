//! # maquette_patina
//!
//! Patina - The validation engine for Maquette.
//!
//! ## Name Origin
//!
//! **Patina** (/ˈpætɪnə/) is the layer that forms on bronze through
//! oxidation over time; in art it is prized as a mark of authenticity and
//! quality. `maquette_patina` examines field values and attests to their
//! quality before a form is allowed out of the atelier.
//!
//! ## Overview
//!
//! Validation rules are declared per field as a pipe-delimited string
//! (`"required|min:3"`), or as an array of such tokens. Each token is either
//! a built-in rule name (optionally parameterized with `:param,param…`), a
//! `regex:/pattern/flags` literal, or the name of a custom rule registered
//! at runtime. Custom rules are predicates over the field value — sync or
//! async — and receive a snapshot of the whole form's values so they can
//! reference sibling fields.
//!
//! Evaluation never short-circuits: every rule runs and every failure
//! message is collected, so a rendering layer can surface all problems at
//! once. A failed future (or an `Err` from a custom rule) is treated
//! identically to a `false` result — the registered error message surfaces
//! regardless of why the rule failed.

mod builtin;
mod engine;
mod error;
mod registry;
mod rule;

pub use engine::{evaluate, ValidationOutcome};
pub use error::{RegistryError, RuleParseError};
pub use registry::{BoxError, CustomRule, CustomRuleFn, RuleRegistry};
pub use rule::{Rule, RuleSet};
