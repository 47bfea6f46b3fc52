//! Grouping and splitting of mappings.

use std::{collections::HashSet, hash::Hash};

use indexmap::IndexMap;

/// Groups the first element of each pair by the second.
///
/// Groups appear in the order their key is first seen; values keep their input order.
///
/// ```rust
/// use nanoutils::utils::group_by_values;
///
/// let letters = ["a", "a", "a", "a", "a", "b", "b", "b", "c"];
/// let grouped = group_by_values((1..).zip(letters));
///
/// assert_eq!(grouped["a"], [1, 2, 3, 4, 5]);
/// assert_eq!(grouped["b"], [6, 7, 8]);
/// assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), ["a", "b", "c"]);
/// ```
pub fn group_by_values<V, K, I>(pairs: I) -> IndexMap<K, Vec<V>>
where
    K: Hash + Eq,
    I: IntoIterator<Item = (V, K)>,
{
    let mut groups: IndexMap<K, Vec<V>> = IndexMap::new();
    for (value, key) in pairs {
        groups.entry(key).or_default().push(value);
    }
    groups
}

/// Which keys [`split_dict`] leaves in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitKeys<K: Hash + Eq> {
    /// Keep these keys; move every other entry out.
    Keep(HashSet<K>),
    /// Move these keys out; keep every other entry.
    Discard(HashSet<K>),
}

impl<K: Hash + Eq> SplitKeys<K> {
    /// Keeps the given keys.
    pub fn keep(keys: impl IntoIterator<Item = K>) -> Self {
        SplitKeys::Keep(keys.into_iter().collect())
    }

    /// Discards the given keys.
    pub fn discard(keys: impl IntoIterator<Item = K>) -> Self {
        SplitKeys::Discard(keys.into_iter().collect())
    }

    fn moves(&self, key: &K) -> bool {
        match self {
            SplitKeys::Keep(keys) => !keys.contains(key),
            SplitKeys::Discard(keys) => keys.contains(key),
        }
    }
}

/// Removes entries from `map` as selected by `keys` and returns them as a new map.
///
/// The returned map lists the entries in their order in `map`. With `preserve_order` the
/// remaining entries of `map` keep their order too; without it they may be reordered, which
/// makes each removal O(1).
///
/// ```rust
/// use indexmap::IndexMap;
/// use nanoutils::utils::{split_dict, SplitKeys};
///
/// let mut map: IndexMap<i32, &str> = [(1, "a"), (2, "b"), (3, "c"), (4, "d")].into();
///
/// let moved = split_dict(&mut map, SplitKeys::keep([1, 2]), true);
/// assert_eq!(map, IndexMap::from([(1, "a"), (2, "b")]));
/// assert_eq!(moved, IndexMap::from([(3, "c"), (4, "d")]));
///
/// let moved = split_dict(&mut map, SplitKeys::discard([1, 2]), true);
/// assert!(map.is_empty());
/// assert_eq!(moved.len(), 2);
/// ```
pub fn split_dict<K, V>(
    map: &mut IndexMap<K, V>,
    keys: SplitKeys<K>,
    preserve_order: bool,
) -> IndexMap<K, V>
where
    K: Hash + Eq + Clone,
{
    let selected: Vec<K> = map.keys().filter(|key| keys.moves(key)).cloned().collect();
    selected
        .into_iter()
        .filter_map(|key| {
            let value = if preserve_order {
                map.shift_remove(&key)
            } else {
                map.swap_remove(&key)
            };
            value.map(|value| (key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_keeps_first_seen_order() {
        let grouped = group_by_values([(1, 'b'), (2, 'a'), (3, 'b')]);
        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), ['b', 'a']);
        assert_eq!(grouped[&'b'], [1, 3]);
        assert!(group_by_values(Vec::<(u8, u8)>::new()).is_empty());
    }

    #[test]
    fn split_preserving_order() {
        let mut map: IndexMap<&str, i32> = [("a", 1), ("b", 2), ("c", 3), ("d", 4)].into();
        let moved = split_dict(&mut map, SplitKeys::discard(["a", "c"]), true);
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), ["b", "d"]);
        assert_eq!(moved.keys().copied().collect::<Vec<_>>(), ["a", "c"]);
    }

    #[test]
    fn split_without_order() {
        let mut map: IndexMap<&str, i32> = [("a", 1), ("b", 2), ("c", 3), ("d", 4)].into();
        let moved = split_dict(&mut map, SplitKeys::keep(["d"]), false);
        assert_eq!(map.len(), 1);
        assert_eq!(map["d"], 4);
        assert_eq!(moved.keys().copied().collect::<Vec<_>>(), ["a", "b", "c"]);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut map: IndexMap<&str, i32> = [("a", 1)].into();
        let moved = split_dict(&mut map, SplitKeys::discard(["x"]), true);
        assert!(moved.is_empty());
        assert_eq!(map.len(), 1);
    }
}
