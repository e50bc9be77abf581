//! # Maquette
//!
//! Declarative form-state engine written in Rust.
//!
//! A form is declared once as plain JSON and compiled into a tree of typed
//! field nodes; values flow in through injection, out through mapped
//! collection, and validation runs asynchronously over the whole tree.
//! Rendering is out of scope — Maquette is the state layer a rendering
//! layer binds to.
//!
//! This crate re-exports all Maquette sub-crates for unified documentation.
//!
//! ## Crates
//!
//! - [`carton`] - Shared toolbox: path grammar, numeric precision, keys
//! - [`patina`] - Validation: rule parsing, built-ins, custom registries
//! - [`armature`] - The field-node tree, form store and options cache
//!
//! ## Example
//!
//! ```
//! use maquette::armature::FormState;
//! use serde_json::json;
//!
//! let mut form = FormState::new(&json!({
//!     "fields": {
//!         "name": {"type": "InputText", "label": "Name",
//!                  "validationRules": "required"},
//!         "country": {
//!             "type": "Select",
//!             "options": [
//!                 {"value": "fr", "label": "France"},
//!                 {"value": "uk", "label": "United Kingdom"},
//!             ],
//!         },
//!     }
//! }))
//! .unwrap();
//!
//! form.inject_values(&json!({"name": "Ada", "country": "uk"}), true).unwrap();
//! assert_eq!(form.values()["country"], json!("uk"));
//! ```

/// Shared toolbox: path grammar, numeric precision helpers, key generation.
pub use maquette_carton as carton;

/// Validation: rule parsing, built-in rules, custom rule registries.
pub use maquette_patina as patina;

/// The field-node tree, form store and options cache.
pub use maquette_armature as armature;

pub use maquette_armature::{FieldNode, FormState};
