//! Carton - The shared toolbox for Maquette.
//!
//! This crate provides the foundational utilities for the Maquette form-state
//! engine, much like a carton (artist's portfolio case) holds the essential
//! tools and materials shared by every other part of the atelier.
//!
//! # Modules
//!
//! - **path**: slash-delimited field addressing with a globally overridable
//!   separator
//! - **num**: decimal precision helpers for step-quantized numeric fields
//! - **keys**: stable id allocation and namespaced render-key generation

pub mod keys;
pub mod num;
pub mod path;

pub use compact_str::CompactString;
pub use rustc_hash::{FxHashMap, FxHashSet};

pub use keys::{next_uid, KeyGenerator};
pub use path::{
    child_path, join_path, parent_path, path_separator, set_path_separator, sibling_path,
    split_path, InvalidSeparator,
};
