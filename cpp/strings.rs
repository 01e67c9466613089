//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-cpp project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// String interning for the pcpp preprocessor
//
// Every identifier name and literal body lives in one StringTable for the
// duration of a translation unit, referenced by a compact StringId (u32):
// - each unique string is stored once
// - O(1) equality comparison by id
// - string-literal concatenation lands back in the table, so tokens stay
//   id-sized no matter how many literals get merged
//

use std::collections::HashMap;
use std::fmt;

// ============================================================================
// StringId - Unique identifier for interned strings
// ============================================================================

/// A unique identifier for an interned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StringId(pub u32);

impl StringId {
    /// The empty string, pre-interned as id 0.
    pub const EMPTY: StringId = StringId(0);
}

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

// ============================================================================
// StringTable - Interned string storage
// ============================================================================

const DEFAULT_STRING_TABLE_CAPACITY: usize = 1024;

/// String interner: HashMap for deduplication, Vec for id -> str lookup.
pub struct StringTable {
    map: HashMap<String, StringId>,
    strings: Vec<String>,
}

impl StringTable {
    /// Create a table with the empty string pre-interned as id 0.
    pub fn new() -> Self {
        let mut table = Self {
            map: HashMap::with_capacity(DEFAULT_STRING_TABLE_CAPACITY),
            strings: Vec::with_capacity(DEFAULT_STRING_TABLE_CAPACITY),
        };
        let empty = table.insert("");
        debug_assert_eq!(empty, StringId::EMPTY);
        table
    }

    fn insert(&mut self, s: &str) -> StringId {
        let id = StringId(self.strings.len() as u32);
        self.strings.push(s.to_string());
        self.map.insert(s.to_string(), id);
        id
    }

    /// Intern a string, returning its unique id. Repeated interning of the
    /// same content returns the same id.
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&id) = self.map.get(s) {
            return id;
        }
        self.insert(s)
    }

    /// Get the string for an id.
    ///
    /// # Panics
    /// Panics if the id did not come from this table.
    pub fn get(&self, id: StringId) -> &str {
        &self.strings[id.0 as usize]
    }

    /// Get the string for an id, or None for an unknown id.
    pub fn get_opt(&self, id: StringId) -> Option<&str> {
        self.strings.get(id.0 as usize).map(|s| s.as_str())
    }

    /// Intern the concatenation of two interned strings. Used by the
    /// post-processor to merge adjacent string literals; cost is linear in
    /// the combined length.
    pub fn concat(&mut self, a: StringId, b: StringId) -> StringId {
        if a == StringId::EMPTY {
            return b;
        }
        if b == StringId::EMPTY {
            return a;
        }
        let mut joined = String::with_capacity(self.get(a).len() + self.get(b).len());
        joined.push_str(self.get(a));
        joined.push_str(self.get(b));
        self.intern(&joined)
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StringTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringTable")
            .field("len", &self.strings.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string_is_zero() {
        let table = StringTable::new();
        assert_eq!(table.get(StringId::EMPTY), "");
    }

    #[test]
    fn test_intern_dedup() {
        let mut table = StringTable::new();
        let id1 = table.intern("foo");
        let id2 = table.intern("foo");
        let id3 = table.intern("bar");
        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(table.get(id1), "foo");
        assert_eq!(table.get(id3), "bar");
    }

    #[test]
    fn test_concat() {
        let mut table = StringTable::new();
        let a = table.intern("foo");
        let b = table.intern("bar");
        let ab = table.concat(a, b);
        assert_eq!(table.get(ab), "foobar");

        // concat result is itself interned
        let ab2 = table.intern("foobar");
        assert_eq!(ab, ab2);
    }

    #[test]
    fn test_concat_empty() {
        let mut table = StringTable::new();
        let a = table.intern("x");
        assert_eq!(table.concat(a, StringId::EMPTY), a);
        assert_eq!(table.concat(StringId::EMPTY, a), a);
    }

    #[test]
    fn test_get_opt_unknown() {
        let table = StringTable::new();
        assert_eq!(table.get_opt(StringId(9999)), None);
    }
}
