//! String interning.
//!
//! Identifiers, member names, and type-parameter names are deduplicated into
//! [`Atom`]s so that name comparison is a `u32` comparison and names can be
//! embedded in interned type data without dragging `String`s around.
//!
//! The interner is sharded ([`DashMap`]) so independent front ends driven in
//! parallel by an external driver can intern concurrently; each atom is
//! written once and read many times.

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::RwLock;

/// An interned string handle.
///
/// Atoms from the same [`Interner`] compare equal iff the underlying strings
/// are equal. Atoms from different interners must never be mixed; this is the
/// caller's responsibility (one interner per compilation session).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// Sentinel for "no name" in contexts that store an atom unconditionally.
    pub const INVALID: Self = Self(u32::MAX);
}

/// Sharded string interner.
pub struct Interner {
    map: DashMap<Arc<str>, Atom, rustc_hash::FxBuildHasher>,
    strings: RwLock<Vec<Arc<str>>>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        Self {
            map: DashMap::default(),
            strings: RwLock::new(Vec::new()),
        }
    }

    /// Intern a string, returning its atom. Idempotent.
    pub fn intern(&self, text: &str) -> Atom {
        if let Some(existing) = self.map.get(text) {
            return *existing;
        }
        let arc: Arc<str> = Arc::from(text);
        let mut strings = self.strings.write().expect("interner lock poisoned");
        // Re-check under the write lock: another shard entry may have won.
        if let Some(existing) = self.map.get(text) {
            return *existing;
        }
        let atom = Atom(u32::try_from(strings.len()).expect("interner overflow"));
        strings.push(arc.clone());
        self.map.insert(arc, atom);
        atom
    }

    /// Resolve an atom back to its string.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        let strings = self.strings.read().expect("interner lock poisoned");
        strings[atom.0 as usize].clone()
    }

    /// Number of distinct interned strings.
    pub fn len(&self) -> usize {
        self.strings.read().expect("interner lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
