// Interned name type for template identifiers
//
// Identifiers are interned to u32 indices so symbol-table keys are Copy,
// compare in O(1), and hash in O(1). Resolving back to the string requires
// the interner.

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// An interned identifier. Equality is an integer comparison; use
/// `StringInterner::resolve` to get the underlying string back.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(u32);

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

/// Deduplicating string interner: identical strings always map to the
/// same `Name`.
#[derive(Clone)]
pub struct StringInterner {
    strings: Vec<Arc<str>>,
    lookup: FxHashMap<Arc<str>, u32>,
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl StringInterner {
    pub fn new() -> Self {
        Self {
            strings: Vec::new(),
            lookup: FxHashMap::default(),
        }
    }

    /// Intern a string, returning its unique `Name`.
    #[inline]
    pub fn intern(&mut self, s: &str) -> Name {
        if let Some(&idx) = self.lookup.get(s) {
            return Name(idx);
        }
        let idx = self.strings.len() as u32;
        let arc: Arc<str> = Arc::from(s);
        self.strings.push(arc.clone());
        self.lookup.insert(arc, idx);
        Name(idx)
    }

    /// Look up a string without interning it.
    pub fn lookup(&self, s: &str) -> Option<Name> {
        self.lookup.get(s).map(|&idx| Name(idx))
    }

    /// Resolve a `Name` back to its string.
    /// Panics if the `Name` came from a different interner.
    #[inline]
    pub fn resolve(&self, name: Name) -> &str {
        &self.strings[name.0 as usize]
    }
}
