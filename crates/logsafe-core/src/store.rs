//! Immutable access-path store (safety state for a single program point)
//!
//! Snapshots are shared through `Arc` and never mutated; updates go through a
//! [`StoreBuilder`] that copies on first write. Snapshots held for other CFG
//! predecessors therefore stay valid.

use crate::access_path::AccessPath;
use crate::safety::Safety;
use indexmap::IndexMap;
use std::sync::Arc;

/// Maps access paths to their current safety. Absent paths read as `Unknown`.
#[derive(Debug, Clone, Default)]
pub struct AccessPathStore {
    entries: Arc<IndexMap<AccessPath, Safety>>,
}

impl AccessPathStore {
    /// Empty store (every path `Unknown`)
    pub fn new() -> Self {
        Self::default()
    }

    /// Safety of `path`, defaulting to `Unknown`
    pub fn get(&self, path: &AccessPath) -> Safety {
        self.entries.get(path).copied().unwrap_or(Safety::Unknown)
    }

    pub fn contains(&self, path: &AccessPath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccessPath, Safety)> {
        self.entries.iter().map(|(path, safety)| (path, *safety))
    }

    /// Builder seeded with this snapshot's contents
    pub fn to_builder(&self) -> StoreBuilder {
        StoreBuilder {
            base: self.clone(),
            updates: IndexMap::new(),
        }
    }

    /// Whether two handles share the same snapshot allocation
    pub fn ptr_eq(&self, other: &AccessPathStore) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    /// Join two stores at a merge point (pointwise restrictive merge).
    ///
    /// A path missing on one side is joined as `Unknown`.
    pub fn join(&self, other: &AccessPathStore) -> AccessPathStore {
        if self.ptr_eq(other) {
            return self.clone();
        }

        let mut entries = IndexMap::with_capacity(self.len().max(other.len()));
        for (path, safety) in self.iter() {
            entries.insert(path.clone(), safety.restrictive_merge(other.get(path)));
        }
        for (path, safety) in other.iter() {
            if !self.contains(path) {
                entries.insert(path.clone(), safety.restrictive_merge(Safety::Unknown));
            }
        }

        AccessPathStore {
            entries: Arc::new(entries),
        }
    }

    /// Join any number of stores; `None` when given none
    pub fn join_all<'a>(stores: impl IntoIterator<Item = &'a AccessPathStore>) -> Option<AccessPathStore> {
        let mut iter = stores.into_iter();
        let first = iter.next()?.clone();
        Some(iter.fold(first, |acc, store| acc.join(store)))
    }
}

impl PartialEq for AccessPathStore {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.entries == other.entries
    }
}

impl Eq for AccessPathStore {}

impl FromIterator<(AccessPath, Safety)> for AccessPathStore {
    fn from_iter<I: IntoIterator<Item = (AccessPath, Safety)>>(iter: I) -> Self {
        AccessPathStore {
            entries: Arc::new(iter.into_iter().collect()),
        }
    }
}

/// Batch of point updates applied on top of a prior snapshot
#[derive(Debug, Clone)]
pub struct StoreBuilder {
    base: AccessPathStore,
    updates: IndexMap<AccessPath, Safety>,
}

impl StoreBuilder {
    pub fn set(&mut self, path: AccessPath, safety: Safety) -> &mut Self {
        self.updates.insert(path, safety);
        self
    }

    /// Current value of `path` including pending updates
    pub fn get(&self, path: &AccessPath) -> Safety {
        self.updates.get(path).copied().unwrap_or_else(|| self.base.get(path))
    }

    pub fn has_updates(&self) -> bool {
        !self.updates.is_empty()
    }

    /// Produce the new snapshot. Without effective updates the base
    /// allocation is reused.
    pub fn build(self) -> AccessPathStore {
        let changed = self
            .updates
            .iter()
            .any(|(path, safety)| !self.base.contains(path) || self.base.get(path) != *safety);
        if !changed {
            return self.base;
        }

        let mut entries = (*self.base.entries).clone();
        entries.extend(self.updates);
        AccessPathStore {
            entries: Arc::new(entries),
        }
    }
}
