//! Dense interner - content-addressed store with stable indices.
//!
//! An [`Interner`] canonicalises byte keys: the first time a key is seen it
//! is copied into the arena, assigned the next dense index, and paired with
//! caller-supplied metadata; every later intern of equal content returns
//! the same entry. Dense indices start at 0, are never reused, and are
//! suitable for direct array indexing (the scope slot arrays rely on this).
//!
//! The compiler runs three of these per compilation: keywords (metadata =
//! token kind, pre-seeded), identifiers, and unescaped string literals.

use rustc_hash::FxHashMap;

use crate::arena::{Arena, ArenaError};
use crate::index_vec::{Idx, IndexVec};

/// One canonical entry: the arena-owned key, its dense index, and the
/// metadata supplied when the key was first interned.
#[derive(Debug)]
pub struct InternEntry<'a, I, M> {
    /// Canonical copy of the key, owned by the arena.
    pub key: &'a str,
    /// Dense index, assigned at first insertion.
    pub index: I,
    /// Caller metadata. Not updated on intern hits.
    pub meta: M,
}

/// Content-addressed store assigning dense indices to canonical keys.
///
/// # Examples
///
/// ```
/// use kilnc_util::{define_idx, Arena, Interner};
///
/// define_idx!(NameId);
///
/// let arena = Arena::new(1024);
/// let mut names: Interner<'_, NameId, ()> = Interner::new(&arena);
/// let a = names.intern("x", ()).unwrap();
/// let b = names.intern("x", ()).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(names.key(a), "x");
/// ```
pub struct Interner<'a, I: Idx, M> {
    arena: &'a Arena,
    map: FxHashMap<&'a str, I>,
    entries: IndexVec<I, InternEntry<'a, I, M>>,
}

impl<'a, I: Idx, M> Interner<'a, I, M> {
    /// Create an empty interner backed by `arena`.
    pub fn new(arena: &'a Arena) -> Self {
        Self {
            arena,
            map: FxHashMap::default(),
            entries: IndexVec::new(),
        }
    }

    /// Intern `key`, returning its dense index.
    ///
    /// On a hit the existing entry is returned unchanged; `meta` is only
    /// stored for a fresh key.
    pub fn intern(&mut self, key: &str, meta: M) -> Result<I, ArenaError> {
        if let Some(&index) = self.map.get(key) {
            return Ok(index);
        }
        let canonical = self.arena.alloc_str(key)?;
        let index = self.entries.next_index();
        self.entries.push(InternEntry {
            key: canonical,
            index,
            meta,
        });
        self.map.insert(canonical, index);
        Ok(index)
    }

    /// Look up `key` without inserting.
    pub fn peek(&self, key: &str) -> Option<&InternEntry<'a, I, M>> {
        self.map.get(key).map(|&index| &self.entries[index])
    }

    /// Get the entry at a dense index.
    ///
    /// # Panics
    ///
    /// Panics if `index` was not produced by this interner.
    pub fn get(&self, index: I) -> &InternEntry<'a, I, M> {
        &self.entries[index]
    }

    /// Canonical key text for a dense index.
    #[inline]
    pub fn key(&self, index: I) -> &'a str {
        self.entries[index].key
    }

    /// Number of distinct keys interned so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in dense-index order (first-insertion order).
    pub fn iter(&self) -> impl Iterator<Item = &InternEntry<'a, I, M>> {
        self.entries.iter()
    }
}
