//! Order-preserving group-by.
//!
//! Keys iterate in order of first occurrence and items keep their relative
//! input order inside each group, so grouping is fully deterministic.

use std::hash::Hash;

use indexmap::IndexMap;

/// Groups produced by [`group_by`], iterated in first-occurrence key order.
#[derive(Debug, Clone)]
pub struct Grouped<K, T> {
    entries: IndexMap<K, Vec<T>>,
}

impl<K: Hash + Eq, T> Grouped<K, T> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn get(&self, key: &K) -> Option<&[T]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[T])> {
        self.entries.iter().map(|(k, items)| (k, items.as_slice()))
    }
}

impl<K, T> IntoIterator for Grouped<K, T> {
    type Item = (K, Vec<T>);
    type IntoIter = indexmap::map::IntoIter<K, Vec<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Partition `items` by `key_fn`.
pub fn group_by<T, K, I, F>(items: I, key_fn: F) -> Grouped<K, T>
where
    I: IntoIterator<Item = T>,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut entries: IndexMap<K, Vec<T>> = IndexMap::new();
    for item in items {
        entries.entry(key_fn(&item)).or_default().push(item);
    }
    Grouped { entries }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
