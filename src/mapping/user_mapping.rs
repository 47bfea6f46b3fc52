//! Insertion-ordered mappings with a read-only and a mutable flavor.

use std::{
    collections::{hash_map::DefaultHasher, HashMap},
    fmt,
    hash::{BuildHasher, Hash, Hasher},
    ops::{BitOr, Deref},
    sync::OnceLock,
};

use indexmap::IndexMap;

use crate::{Error, Result};

/// Line width beyond which mappings are printed one entry per line.
const REPR_WIDTH: usize = 76;

pub(crate) fn fmt_entries<'a, K, V, I>(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    entries: I,
) -> fmt::Result
where
    K: fmt::Debug + 'a,
    V: fmt::Debug + 'a,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    let entries: Vec<String> = entries.map(|(k, v)| format!("{k:?}: {v:?}")).collect();
    let single = format!("{{{}}}", entries.join(", "));
    if single.len() <= REPR_WIDTH {
        return write!(f, "{name}({single})");
    }
    writeln!(f, "{name}({{")?;
    for entry in &entries {
        writeln!(f, "    {entry},")?;
    }
    f.write_str("})")
}

/// An immutable, insertion-ordered mapping.
///
/// Read access goes through [`Deref`] to the underlying [`IndexMap`]. Equality ignores order,
/// like any mapping comparison. The hash is order-insensitive as well, computed on first use
/// and cached. `clone` copies the entries.
///
/// # Examples
///
/// ```rust
/// use nanoutils::mapping::UserMapping;
///
/// let a: UserMapping<&str, i32> = [("a", 0), ("b", 1)].into_iter().collect();
/// let b: UserMapping<&str, i32> = [("b", 5), ("c", 2)].into_iter().collect();
///
/// let merged = &a | &b;
/// assert_eq!(merged.keys().copied().collect::<Vec<_>>(), ["a", "b", "c"]);
/// assert_eq!(merged["b"], 5);
/// assert_eq!(a.to_string(), r#"UserMapping({"a": 0, "b": 1})"#);
/// ```
#[derive(Clone)]
pub struct UserMapping<K, V> {
    map: IndexMap<K, V>,
    hash: OnceLock<u64>,
}

impl<K: Hash + Eq, V> UserMapping<K, V> {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::from_map(IndexMap::new())
    }

    fn from_map(map: IndexMap<K, V>) -> Self {
        UserMapping {
            map,
            hash: OnceLock::new(),
        }
    }

    /// Maps every key of `keys` to a clone of `value`.
    pub fn from_keys(keys: impl IntoIterator<Item = K>, value: V) -> Self
    where
        V: Clone,
    {
        keys.into_iter().map(|key| (key, value.clone())).collect()
    }

    /// The underlying map.
    pub fn as_map(&self) -> &IndexMap<K, V> {
        &self.map
    }

    /// Keys in reverse insertion order.
    pub fn rev_keys(&self) -> impl Iterator<Item = &K> {
        self.map.keys().rev()
    }

    /// A new mapping with the entries of `self` updated by `other`.
    ///
    /// Keys keep their first position; values from `other` win.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self
    where
        K: Clone,
        V: Clone,
    {
        let mut map = self.map.clone();
        map.extend(other.map.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self::from_map(map)
    }

    /// A mutable copy of this mapping.
    pub fn to_mutable(&self) -> MutableUserMapping<K, V>
    where
        K: Clone,
        V: Clone,
    {
        MutableUserMapping {
            map: self.map.clone(),
        }
    }

    /// The cached, order-insensitive hash code.
    pub fn hash_code(&self) -> u64
    where
        V: Hash,
    {
        *self.hash.get_or_init(|| {
            // Sum of per-entry hashes, so insertion order does not matter
            self.map.iter().fold(0_u64, |acc, entry| {
                let mut hasher = DefaultHasher::new();
                entry.hash(&mut hasher);
                acc.wrapping_add(hasher.finish())
            })
        })
    }
}

impl<K: Hash + Eq, V> Default for UserMapping<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for UserMapping<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

impl<K: Hash + Eq, V> From<IndexMap<K, V>> for UserMapping<K, V> {
    fn from(map: IndexMap<K, V>) -> Self {
        Self::from_map(map)
    }
}

impl<K, V> Deref for UserMapping<K, V> {
    type Target = IndexMap<K, V>;

    fn deref(&self) -> &IndexMap<K, V> {
        &self.map
    }
}

impl<'a, K, V> IntoIterator for &'a UserMapping<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = indexmap::map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}

impl<K: Hash + Eq + Clone, V: Clone> BitOr for &UserMapping<K, V> {
    type Output = UserMapping<K, V>;

    fn bitor(self, rhs: Self) -> UserMapping<K, V> {
        self.union(rhs)
    }
}

impl<K: Hash + Eq, V: Hash> Hash for UserMapping<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for UserMapping<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<K: Hash + Eq, V: Eq> Eq for UserMapping<K, V> {}

impl<K: Hash + Eq, V: PartialEq> PartialEq<MutableUserMapping<K, V>> for UserMapping<K, V> {
    fn eq(&self, other: &MutableUserMapping<K, V>) -> bool {
        self.map == other.map
    }
}

impl<K, V, S> PartialEq<HashMap<K, V, S>> for UserMapping<K, V>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &HashMap<K, V, S>) -> bool {
        self.map.len() == other.len()
            && self
                .map
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| v == o))
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Display for UserMapping<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_entries(f, "UserMapping", self.map.iter())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for UserMapping<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A mutable, insertion-ordered mapping.
///
/// Read access goes through [`Deref`]; edits go through the methods below so the mapping
/// keeps its insertion order on removal. The type is not `Hash`.
#[derive(Clone)]
pub struct MutableUserMapping<K, V> {
    map: IndexMap<K, V>,
}

impl<K: Hash + Eq, V> MutableUserMapping<K, V> {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        MutableUserMapping {
            map: IndexMap::new(),
        }
    }

    /// Maps every key of `keys` to a clone of `value`.
    pub fn from_keys(keys: impl IntoIterator<Item = K>, value: V) -> Self
    where
        V: Clone,
    {
        keys.into_iter().map(|key| (key, value.clone())).collect()
    }

    /// Inserts or replaces a value, returning the previous one.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    /// Removes `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.map.shift_remove(key)
    }

    /// Removes `key` and returns its value.
    ///
    /// # Errors
    /// Returns [`Error::Key`] when `key` is absent.
    pub fn pop(&mut self, key: &K) -> Result<V>
    where
        K: fmt::Debug,
    {
        self.remove(key)
            .ok_or_else(|| Error::Key(format!("{key:?}")))
    }

    /// Removes and returns the most recently inserted entry.
    ///
    /// # Errors
    /// Returns [`Error::Key`] when the mapping is empty.
    pub fn pop_item(&mut self) -> Result<(K, V)> {
        self.map
            .pop()
            .ok_or_else(|| Error::Key("popitem(): mapping is empty".to_string()))
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Inserts every entry of `entries`, replacing existing values.
    pub fn update(&mut self, entries: impl IntoIterator<Item = (K, V)>) {
        self.map.extend(entries);
    }

    /// Returns the value of `key`, inserting `default` first when absent.
    pub fn set_default(&mut self, key: K, default: V) -> &mut V {
        self.map.entry(key).or_insert(default)
    }

    /// Mutable access to the value of `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.map.get_mut(key)
    }

    /// An immutable copy of this mapping.
    pub fn freeze(&self) -> UserMapping<K, V>
    where
        K: Clone,
        V: Clone,
    {
        UserMapping::from_map(self.map.clone())
    }

    /// Always fails: the contents can change, so no stable hash exists.
    ///
    /// # Errors
    /// Always returns [`Error::Unhashable`].
    pub fn hash_code(&self) -> Result<u64> {
        Err(Error::Unhashable("MutableUserMapping"))
    }
}

impl<K: Hash + Eq, V> Default for MutableUserMapping<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for MutableUserMapping<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        MutableUserMapping {
            map: iter.into_iter().collect(),
        }
    }
}

impl<K: Hash + Eq, V> Extend<(K, V)> for MutableUserMapping<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.update(iter);
    }
}

impl<K, V> Deref for MutableUserMapping<K, V> {
    type Target = IndexMap<K, V>;

    fn deref(&self) -> &IndexMap<K, V> {
        &self.map
    }
}

impl<'a, K, V> IntoIterator for &'a MutableUserMapping<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = indexmap::map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for MutableUserMapping<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq<UserMapping<K, V>> for MutableUserMapping<K, V> {
    fn eq(&self, other: &UserMapping<K, V>) -> bool {
        self.map == other.map
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Display for MutableUserMapping<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_entries(f, "MutableUserMapping", self.map.iter())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for MutableUserMapping<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> UserMapping<&'static str, i32> {
        [("a", 0), ("b", 1), ("c", 2)].into_iter().collect()
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn read_access() {
        let mapping = abc();
        assert_eq!(mapping["b"], 1);
        assert_eq!(mapping.get("z"), None);
        assert!(mapping.contains_key("c"));
        assert_eq!(mapping.rev_keys().copied().collect::<Vec<_>>(), ["c", "b", "a"]);
        assert_eq!(mapping.values().sum::<i32>(), 3);
    }

    #[test]
    fn equality_and_hash_ignore_order() {
        let forward = abc();
        let backward: UserMapping<_, _> = [("c", 2), ("b", 1), ("a", 0)].into_iter().collect();
        assert_eq!(forward, backward);
        assert_eq!(hash_of(&forward), hash_of(&backward));
        assert_eq!(hash_of(&forward), hash_of(&forward.clone()));

        let plain: HashMap<_, _> = [("a", 0), ("b", 1), ("c", 2)].into_iter().collect();
        assert_eq!(forward, plain);
    }

    #[test]
    fn union_keeps_positions() {
        let other: UserMapping<_, _> = [("c", 8), ("d", 3)].into_iter().collect();
        let merged = &abc() | &other;
        assert_eq!(merged.keys().copied().collect::<Vec<_>>(), ["a", "b", "c", "d"]);
        assert_eq!(merged["c"], 8);
    }

    #[test]
    fn from_keys() {
        let mapping = UserMapping::from_keys(["x", "y"], 0_u8);
        assert_eq!(mapping.len(), 2);
        assert!(mapping.values().all(|v| *v == 0));
    }

    #[test]
    fn display() {
        assert_eq!(abc().to_string(), r#"UserMapping({"a": 0, "b": 1, "c": 2})"#);

        let long: UserMapping<String, usize> = (0..12).map(|i| (format!("key{i}"), i)).collect();
        let rendered = long.to_string();
        assert!(rendered.starts_with("UserMapping({\n    \"key0\": 0,\n"));
        assert!(rendered.ends_with("    \"key11\": 11,\n})"));
    }

    #[test]
    fn mutation() {
        let mut mapping = abc().to_mutable();
        assert!(matches!(mapping.hash_code(), Err(Error::Unhashable(_))));

        mapping.insert("d", 3);
        assert_eq!(mapping.remove(&"a"), Some(0));
        assert_eq!(mapping.keys().copied().collect::<Vec<_>>(), ["b", "c", "d"]);

        assert_eq!(mapping.pop(&"b").unwrap(), 1);
        assert!(matches!(mapping.pop(&"b"), Err(Error::Key(_))));
        assert_eq!(mapping.pop_item().unwrap(), ("d", 3));

        *mapping.set_default("e", 10) += 1;
        assert_eq!(mapping["e"], 11);
        assert_eq!(*mapping.set_default("e", 0), 11);

        mapping.update([("c", 20), ("f", 5)]);
        assert_eq!(mapping["c"], 20);

        let frozen = mapping.freeze();
        assert_eq!(frozen, mapping);

        mapping.clear();
        assert!(mapping.is_empty());
        assert!(matches!(mapping.pop_item(), Err(Error::Key(_))));
        assert!(!frozen.is_empty());
    }
}
