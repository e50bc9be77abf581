//! Field path addressing.
//!
//! Fields are addressed from the form root by slash-delimited paths such as
//! `/people/0/firstname`, alternating field names and instance indices for
//! repeatable containers. The separator is process-global and can be
//! overridden once by the host application before any form is constructed.

use compact_str::CompactString;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use thiserror::Error;

static SEPARATOR: Lazy<RwLock<CompactString>> = Lazy::new(|| RwLock::new(CompactString::new("/")));

/// Error returned when an empty separator is supplied.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("path separator must be a non-empty string")]
pub struct InvalidSeparator;

/// Override the global path node separator.
pub fn set_path_separator(separator: &str) -> Result<(), InvalidSeparator> {
    if separator.is_empty() {
        return Err(InvalidSeparator);
    }
    *SEPARATOR.write() = CompactString::new(separator);
    Ok(())
}

/// The current global path node separator.
pub fn path_separator() -> CompactString {
    SEPARATOR.read().clone()
}

/// Split a path into its non-empty segments.
pub fn split_path(path: &str) -> Vec<String> {
    let sep = path_separator();
    path.split(sep.as_str())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join segments into a path, prefixed with the separator.
pub fn join_path<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let sep = path_separator();
    let mut out = String::new();
    for part in parts {
        out.push_str(sep.as_str());
        out.push_str(part.as_ref());
    }
    out
}

/// Append a child segment to a base path.
pub fn child_path(base: &str, name: &str) -> String {
    let sep = path_separator();
    format!("{base}{sep}{name}")
}

/// The parent of a path, i.e. everything before the last separator.
///
/// Returns an empty string for root-level paths.
pub fn parent_path(path: &str) -> String {
    let sep = path_separator();
    match path.rfind(sep.as_str()) {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

/// The path a sibling named `name` would have.
pub fn sibling_path(path: &str, name: &str) -> String {
    child_path(&parent_path(path), name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/people/0/firstname"), ["people", "0", "firstname"]);
        assert_eq!(split_path(""), Vec::<String>::new());
        assert_eq!(split_path("//a//b/"), ["a", "b"]);
    }

    #[test]
    fn test_join_and_child() {
        assert_eq!(join_path(["people", "0"]), "/people/0");
        assert_eq!(child_path("/people/0", "firstname"), "/people/0/firstname");
    }

    #[test]
    fn test_parent_and_sibling() {
        assert_eq!(parent_path("/people/0/firstname"), "/people/0");
        assert_eq!(parent_path("root"), "");
        assert_eq!(sibling_path("/people/0/firstname", "lastname"), "/people/0/lastname");
    }

    #[test]
    fn test_set_separator_rejects_empty() {
        assert_eq!(set_path_separator(""), Err(InvalidSeparator));
        assert_eq!(path_separator(), "/");
    }
}
