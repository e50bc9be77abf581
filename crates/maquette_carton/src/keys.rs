//! Stable ids and namespaced render keys.
//!
//! Every field node gets an opaque process-unique id at creation. Side
//! tables (render keys, bookkeeping) are keyed by that id instead of by
//! object identity, with explicit removal when a node is destroyed.

use std::sync::atomic::{AtomicU64, Ordering};

use compact_str::CompactString;
use rustc_hash::FxHashMap;

static UID: AtomicU64 = AtomicU64::new(1);

/// Allocate the next process-unique id.
pub fn next_uid() -> u64 {
    UID.fetch_add(1, Ordering::Relaxed)
}

/// Namespaced unique-key cache for stable list rendering keys.
///
/// The same `(id, namespace)` pair always yields the same key for the
/// lifetime of the generator.
#[derive(Debug, Default)]
pub struct KeyGenerator {
    counter: u64,
    keys: FxHashMap<(u64, CompactString), CompactString>,
}

impl KeyGenerator {
    /// Create an empty generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or mint) the key for `id` under `namespace`.
    pub fn key_for(&mut self, id: u64, namespace: &str) -> CompactString {
        let slot = (id, CompactString::new(namespace));
        if let Some(key) = self.keys.get(&slot) {
            return key.clone();
        }
        self.counter += 1;
        let key = CompactString::new(format!("{namespace}_{}", self.counter));
        self.keys.insert(slot, key.clone());
        key
    }

    /// Drop every key minted for `id`, in all namespaces.
    pub fn forget(&mut self, id: u64) {
        self.keys.retain(|(key_id, _), _| *key_id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_uid_unique() {
        let a = next_uid();
        let b = next_uid();
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_for_stable() {
        let mut generator = KeyGenerator::new();
        let first = generator.key_for(7, "row");
        assert_eq!(generator.key_for(7, "row"), first);
        assert_ne!(generator.key_for(8, "row"), first);
        assert_ne!(generator.key_for(7, "cell"), first);
    }

    #[test]
    fn test_forget() {
        let mut generator = KeyGenerator::new();
        let first = generator.key_for(7, "row");
        generator.forget(7);
        assert_ne!(generator.key_for(7, "row"), first);
    }
}
