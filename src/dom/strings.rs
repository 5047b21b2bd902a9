//! String interning pool
//!
//! Deduplicated string storage for element names, attribute names and
//! values, and text content. All strings are copied into a single buffer;
//! entries are (offset, len) pairs indexed by string id. A hash index maps
//! content hashes to candidate ids to avoid storing duplicates.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// String interning pool
///
/// Id 0 is reserved for the empty string.
#[derive(Debug, Default)]
pub struct StringPool {
    /// (offset, len) into `data`, indexed by string id
    entries: Vec<(u32, u32)>,
    /// Backing buffer for all interned strings
    data: Vec<u8>,
    /// Content hash -> ids with that hash (handles rare collisions)
    hash_index: HashMap<u64, Vec<u32>>,
}

impl StringPool {
    /// Create a new empty pool
    pub fn new() -> Self {
        let mut pool = StringPool {
            entries: Vec::with_capacity(64),
            data: Vec::with_capacity(1024),
            hash_index: HashMap::new(),
        };
        pool.entries.push((0, 0)); // id 0: ""
        pool
    }

    #[inline]
    fn compute_hash(s: &[u8]) -> u64 {
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern a string, returning its id
    ///
    /// Identical content always yields the same id.
    pub fn intern(&mut self, s: &[u8]) -> u32 {
        if s.is_empty() {
            return 0;
        }

        let hash = Self::compute_hash(s);
        if let Some(ids) = self.hash_index.get(&hash) {
            for &id in ids {
                if self.get(id) == s {
                    return id;
                }
            }
        }

        let offset = self.data.len() as u32;
        self.data.extend_from_slice(s);
        let id = self.entries.len() as u32;
        self.entries.push((offset, s.len() as u32));
        self.hash_index.entry(hash).or_default().push(id);
        id
    }

    /// Get the bytes for a string id
    ///
    /// Unknown ids resolve to the empty string.
    pub fn get(&self, id: u32) -> &[u8] {
        match self.entries.get(id as usize) {
            Some(&(offset, len)) => &self.data[offset as usize..(offset + len) as usize],
            None => b"",
        }
    }

    /// Get a string id as UTF-8
    ///
    /// The pool only ever stores slices of input that was validated as
    /// UTF-8, so this cannot observe invalid data in practice.
    pub fn get_str(&self, id: u32) -> &str {
        std::str::from_utf8(self.get(id)).unwrap_or("")
    }

    /// Number of interned strings (including the reserved empty string)
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_get() {
        let mut pool = StringPool::new();
        let id = pool.intern(b"hello");
        assert!(id > 0);
        assert_eq!(pool.get(id), b"hello");
        assert_eq!(pool.get_str(id), "hello");
    }

    #[test]
    fn test_intern_deduplicates() {
        let mut pool = StringPool::new();
        let id1 = pool.intern(b"hello");
        let id2 = pool.intern(b"hello");
        assert_eq!(id1, id2);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_distinct_strings() {
        let mut pool = StringPool::new();
        assert_ne!(pool.intern(b"hello"), pool.intern(b"world"));
    }

    #[test]
    fn test_empty_string() {
        let mut pool = StringPool::new();
        assert_eq!(pool.intern(b""), 0);
        assert_eq!(pool.get(0), b"");
    }

    #[test]
    fn test_unknown_id() {
        let pool = StringPool::new();
        assert_eq!(pool.get(999), b"");
    }
}
