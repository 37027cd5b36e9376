//! Identity keys and the per-call bookkeeping structures.
//!
//! The reference map, visited set, and visited-pair set all key on *object
//! identity*: the address of the heap allocation behind a handle. They are
//! created per top-level `copy`/`is_mutable`/`structural_equals` call, live
//! on one thread, and are dropped when the call returns; no locking is
//! involved.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::value::Value;

/// The identity of one heap allocation, usable as a map key.
///
/// Leaf values (null, primitives, enums) have no identity and yield no key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityKey(usize);

impl IdentityKey {
    /// The identity of a value's heap allocation, if it has one
    #[must_use]
    pub fn of(value: &Value) -> Option<IdentityKey> {
        match value {
            Value::Object(object) => Some(IdentityKey(Arc::as_ptr(object) as usize)),
            Value::Array(array) => Some(IdentityKey(Arc::as_ptr(array) as usize)),
            Value::Function(function) => Some(IdentityKey(Arc::as_ptr(function) as usize)),
            _ => None,
        }
    }

    /// The raw pointer bits, used by the identity hash
    #[must_use]
    pub fn bits(&self) -> usize {
        self.0
    }
}

/// Identity-keyed mapping from originals to their in-progress copies.
///
/// One reference map exists per top-level copy call. The copier registers a
/// freshly allocated shell *before* copying its children, so aliased and
/// cyclic references resolve to the single copy.
#[derive(Debug, Default)]
pub struct RefMap {
    entries: FxHashMap<IdentityKey, Value>,
}

impl RefMap {
    /// Create an empty reference map
    #[must_use]
    pub fn new() -> Self {
        RefMap {
            entries: FxHashMap::default(),
        }
    }

    /// Record the copy of an original
    pub fn insert(&mut self, original: &Value, copy: Value) {
        if let Some(key) = IdentityKey::of(original) {
            self.entries.insert(key, copy);
        }
    }

    /// Look up the already-created copy of an original
    #[must_use]
    pub fn get(&self, original: &Value) -> Option<Value> {
        IdentityKey::of(original).and_then(|key| self.entries.get(&key).cloned())
    }

    /// Number of recorded originals
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been recorded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Identity set used by the instance-level mutability check to cut
/// recursion on cyclic object graphs. Value types are never added; they
/// have no identity.
#[derive(Debug, Default)]
pub struct VisitedSet {
    entries: FxHashSet<IdentityKey>,
}

impl VisitedSet {
    /// Create an empty visited set
    #[must_use]
    pub fn new() -> Self {
        VisitedSet {
            entries: FxHashSet::default(),
        }
    }

    /// Add a value's identity; returns false if it was already present
    pub fn insert(&mut self, value: &Value) -> bool {
        match IdentityKey::of(value) {
            Some(key) => self.entries.insert(key),
            // Identity-free values are never tracked
            None => true,
        }
    }
}

/// Set of ordered identity pairs used by structural equality to terminate
/// on cyclic graphs. Insertion closes the set under swap, so a pair seen as
/// `(a, b)` is also seen as `(b, a)`.
#[derive(Debug, Default)]
pub struct PairSet {
    entries: FxHashSet<(IdentityKey, IdentityKey)>,
}

impl PairSet {
    /// Create an empty pair set
    #[must_use]
    pub fn new() -> Self {
        PairSet {
            entries: FxHashSet::default(),
        }
    }

    /// Returns true if the pair (in either order) was already recorded
    #[must_use]
    pub fn contains(&self, a: &Value, b: &Value) -> bool {
        match (IdentityKey::of(a), IdentityKey::of(b)) {
            (Some(ka), Some(kb)) => self.entries.contains(&(ka, kb)),
            _ => false,
        }
    }

    /// Record the pair and its swap. Identity-free values are not tracked.
    pub fn insert(&mut self, a: &Value, b: &Value) {
        if let (Some(ka), Some(kb)) = (IdentityKey::of(a), IdentityKey::of(b)) {
            self.entries.insert((ka, kb));
            self.entries.insert((kb, ka));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::token::TypeToken;
    use crate::value::ObjectInstance;

    fn object() -> Value {
        Value::Object(ObjectInstance::new(TypeToken::new(0x200), 0))
    }

    #[test]
    fn test_identity_only_for_heap_values() {
        assert!(IdentityKey::of(&object()).is_some());
        assert!(IdentityKey::of(&Value::from_i32(1)).is_none());
        assert!(IdentityKey::of(&Value::Null).is_none());
    }

    #[test]
    fn test_refmap_roundtrip() {
        let original = object();
        let copy = object();
        let mut refs = RefMap::new();
        assert!(refs.get(&original).is_none());
        refs.insert(&original, copy.clone());
        assert_eq!(refs.get(&original), Some(copy));
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn test_refmap_ignores_leaves() {
        let mut refs = RefMap::new();
        refs.insert(&Value::from_i32(1), Value::from_i32(2));
        assert!(refs.is_empty());
    }

    #[test]
    fn test_visited_set_detects_revisit() {
        let value = object();
        let mut visited = VisitedSet::new();
        assert!(visited.insert(&value));
        assert!(!visited.insert(&value));
        // Leaves are never tracked
        assert!(visited.insert(&Value::from_i32(1)));
        assert!(visited.insert(&Value::from_i32(1)));
    }

    #[test]
    fn test_pair_set_closed_under_swap() {
        let a = object();
        let b = object();
        let mut pairs = PairSet::new();
        assert!(!pairs.contains(&a, &b));
        pairs.insert(&a, &b);
        assert!(pairs.contains(&a, &b));
        assert!(pairs.contains(&b, &a));
    }
}
