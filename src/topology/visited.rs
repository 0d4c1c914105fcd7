use std::collections::HashSet;
use std::hash::Hash;

/// Scratch membership set owned by a single algorithm invocation.
///
/// Replaces per-element tag bits: it lives on the caller's stack, so no state
/// survives into the mesh or into the next call.
#[derive(Debug, Clone)]
pub struct VisitedSet<K> {
    members: HashSet<K>,
}

impl<K: Copy + Eq + Hash> VisitedSet<K> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            members: HashSet::new(),
        }
    }

    /// Marks `key`. Returns `true` if it was not marked before.
    pub fn insert(&mut self, key: K) -> bool {
        self.members.insert(key)
    }

    /// Returns `true` if `key` is marked.
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.members.contains(&key)
    }

    /// Number of marked keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if nothing is marked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterates over marked keys in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.members.iter().copied()
    }

    /// Consumes the set, returning the marked keys.
    #[must_use]
    pub fn into_inner(self) -> HashSet<K> {
        self.members
    }
}

impl<K: Copy + Eq + Hash> Default for VisitedSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash> FromIterator<K> for VisitedSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}
