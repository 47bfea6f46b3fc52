//! Ordered field-name to dtype mappings.

use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::{BitOr, Deref},
    sync::OnceLock,
};

use indexmap::IndexMap;

use crate::{
    mapping::dtype::{DType, IntoDType, StructuredDType},
    Error, Result,
};

fn collect_fields<I, K, D>(fields: I) -> Result<IndexMap<String, DType>>
where
    I: IntoIterator<Item = (K, D)>,
    K: Into<String>,
    D: IntoDType,
{
    fields
        .into_iter()
        .map(|(name, dtype)| -> Result<(String, DType)> {
            Ok((name.into(), dtype.into_dtype()?))
        })
        .collect()
}

fn fmt_fields(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    fields: &IndexMap<String, DType>,
) -> fmt::Result {
    if fields.is_empty() {
        return write!(f, "{name}()");
    }
    let width = fields.keys().map(String::len).max().unwrap_or(0);
    writeln!(f, "{name}(")?;
    for (key, dtype) in fields {
        writeln!(f, "    {key:<width$} = {dtype},")?;
    }
    f.write_str(")")
}

/// An immutable mapping of field names to [`DType`]s, in declaration order.
///
/// Unlike ordinary mappings, field order is part of the value: equality and the hash both
/// depend on it, since it decides the record layout. The structured dtype is built on first
/// access and cached.
///
/// # Examples
///
/// ```rust
/// use nanoutils::mapping::DTypeMapping;
///
/// let fields = DTypeMapping::new([("a", "i8"), ("b", "float"), ("c", "U5")])?;
/// assert_eq!(fields.dtype().itemsize(), 8 + 8 + 20);
/// assert_eq!(
///     fields.to_string(),
///     "DTypeMapping(\n    a = int64,\n    b = float64,\n    c = <U5,\n)"
/// );
/// # Ok::<(), nanoutils::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct DTypeMapping {
    fields: IndexMap<String, DType>,
    dtype: OnceLock<StructuredDType>,
    hash: OnceLock<u64>,
}

impl DTypeMapping {
    /// Builds a mapping, converting every value with [`IntoDType`].
    ///
    /// # Errors
    /// Returns [`Error::DType`] when a value is not a valid dtype description.
    pub fn new<I, K, D>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: IntoDType,
    {
        Ok(Self::from_map(collect_fields(fields)?))
    }

    fn from_map(fields: IndexMap<String, DType>) -> Self {
        DTypeMapping {
            fields,
            dtype: OnceLock::new(),
            hash: OnceLock::new(),
        }
    }

    /// Maps every name of `names` to the same dtype.
    ///
    /// # Errors
    /// Returns [`Error::DType`] when `dtype` is not a valid dtype description.
    pub fn from_keys<K: Into<String>>(
        names: impl IntoIterator<Item = K>,
        dtype: impl IntoDType,
    ) -> Result<Self> {
        let dtype = dtype.into_dtype()?;
        Ok(Self::from_map(
            names
                .into_iter()
                .map(|name| (name.into(), dtype.clone()))
                .collect(),
        ))
    }

    /// The structured dtype with one field per entry.
    pub fn dtype(&self) -> &StructuredDType {
        self.dtype.get_or_init(|| {
            StructuredDType::new(
                self.fields
                    .iter()
                    .map(|(name, dtype)| (name.clone(), dtype.clone())),
            )
        })
    }

    /// The dtype of field `name`.
    ///
    /// # Errors
    /// Returns [`Error::Key`] when there is no such field.
    pub fn field(&self, name: &str) -> Result<&DType> {
        self.fields
            .get(name)
            .ok_or_else(|| Error::Key(name.to_string()))
    }

    /// A new mapping with the fields of `self` updated by `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut fields = self.fields.clone();
        fields.extend(other.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self::from_map(fields)
    }

    /// A mutable copy of this mapping.
    pub fn to_mutable(&self) -> MutableDTypeMapping {
        MutableDTypeMapping {
            fields: self.fields.clone(),
        }
    }

    /// The cached, order-sensitive hash code.
    pub fn hash_code(&self) -> u64 {
        *self.hash.get_or_init(|| {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            for entry in &self.fields {
                entry.hash(&mut hasher);
            }
            hasher.finish()
        })
    }
}

impl Deref for DTypeMapping {
    type Target = IndexMap<String, DType>;

    fn deref(&self) -> &Self::Target {
        &self.fields
    }
}

impl<'a> IntoIterator for &'a DTypeMapping {
    type Item = (&'a String, &'a DType);
    type IntoIter = indexmap::map::Iter<'a, String, DType>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl BitOr for &DTypeMapping {
    type Output = DTypeMapping;

    fn bitor(self, rhs: Self) -> DTypeMapping {
        self.union(rhs)
    }
}

impl PartialEq for DTypeMapping {
    fn eq(&self, other: &Self) -> bool {
        self.fields.iter().eq(other.fields.iter())
    }
}

impl Eq for DTypeMapping {}

impl PartialEq<MutableDTypeMapping> for DTypeMapping {
    fn eq(&self, other: &MutableDTypeMapping) -> bool {
        self.fields.iter().eq(other.fields.iter())
    }
}

impl Hash for DTypeMapping {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl fmt::Display for DTypeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_fields(f, "DTypeMapping", &self.fields)
    }
}

impl fmt::Debug for DTypeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::mapping::user_mapping::fmt_entries(f, "DTypeMapping", self.fields.iter())
    }
}

/// A [`DTypeMapping`] whose fields can be added, replaced and removed.
///
/// The structured dtype is rebuilt on every call to [`MutableDTypeMapping::dtype`].
#[derive(Clone, Default)]
pub struct MutableDTypeMapping {
    fields: IndexMap<String, DType>,
}

impl MutableDTypeMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mapping, converting every value with [`IntoDType`].
    ///
    /// # Errors
    /// Returns [`Error::DType`] when a value is not a valid dtype description.
    pub fn from_fields<I, K, D>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: IntoDType,
    {
        Ok(MutableDTypeMapping {
            fields: collect_fields(fields)?,
        })
    }

    /// Sets field `name`, keeping its position if it already exists.
    ///
    /// # Errors
    /// Returns [`Error::DType`] when `dtype` is not a valid dtype description.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        dtype: impl IntoDType,
    ) -> Result<Option<DType>> {
        Ok(self.fields.insert(name.into(), dtype.into_dtype()?))
    }

    /// Removes field `name`, shifting later fields forward.
    ///
    /// # Errors
    /// Returns [`Error::Key`] when there is no such field.
    pub fn remove(&mut self, name: &str) -> Result<DType> {
        self.fields
            .shift_remove(name)
            .ok_or_else(|| Error::Key(name.to_string()))
    }

    /// Inserts every field of `fields`.
    ///
    /// # Errors
    /// Returns [`Error::DType`] on the first invalid value; earlier fields stay inserted.
    pub fn update<I, K, D>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: IntoDType,
    {
        for (name, dtype) in fields {
            self.insert(name, dtype)?;
        }
        Ok(())
    }

    /// Removes all fields.
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// The structured dtype of the current fields.
    pub fn dtype(&self) -> StructuredDType {
        StructuredDType::new(
            self.fields
                .iter()
                .map(|(name, dtype)| (name.clone(), dtype.clone())),
        )
    }

    /// An immutable copy of this mapping.
    pub fn freeze(&self) -> DTypeMapping {
        DTypeMapping::from_map(self.fields.clone())
    }

    /// Mutable mappings have no stable hash.
    ///
    /// # Errors
    /// Always returns [`Error::Unhashable`].
    pub fn hash_code(&self) -> Result<u64> {
        Err(Error::Unhashable("MutableDTypeMapping"))
    }
}

impl Deref for MutableDTypeMapping {
    type Target = IndexMap<String, DType>;

    fn deref(&self) -> &Self::Target {
        &self.fields
    }
}

impl PartialEq for MutableDTypeMapping {
    fn eq(&self, other: &Self) -> bool {
        self.fields.iter().eq(other.fields.iter())
    }
}

impl Eq for MutableDTypeMapping {}

impl PartialEq<DTypeMapping> for MutableDTypeMapping {
    fn eq(&self, other: &DTypeMapping) -> bool {
        other == self
    }
}

impl fmt::Display for MutableDTypeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_fields(f, "MutableDTypeMapping", &self.fields)
    }
}

impl fmt::Debug for MutableDTypeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::mapping::user_mapping::fmt_entries(f, "MutableDTypeMapping", self.fields.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::dtype::ScalarKind;

    fn sample() -> DTypeMapping {
        DTypeMapping::new([("a", "i8"), ("b", "float"), ("c", "U5")]).unwrap()
    }

    #[test]
    fn display() {
        assert_eq!(
            sample().to_string(),
            "DTypeMapping(\n    a = int64,\n    b = float64,\n    c = <U5,\n)"
        );
        assert_eq!(DTypeMapping::default().to_string(), "DTypeMapping()");

        let aligned = DTypeMapping::new([("x", "f8"), ("charge", "i8")]).unwrap();
        assert_eq!(
            aligned.to_string(),
            "DTypeMapping(\n    x      = float64,\n    charge = int64,\n)"
        );
    }

    #[test]
    fn order_matters() {
        let a = sample();
        let b = DTypeMapping::new([("b", "float"), ("a", "i8"), ("c", "U5")]).unwrap();
        assert_ne!(a, b);
        assert_ne!(a.hash_code(), b.hash_code());
        assert_eq!(a, sample());
        assert_eq!(a.hash_code(), sample().hash_code());
    }

    #[test]
    fn structured_dtype() {
        let mapping = sample();
        let dtype = mapping.dtype();
        assert_eq!(dtype.fields().len(), 3);
        assert_eq!(dtype.field("c").unwrap().offset, 16);
        assert!(std::ptr::eq(dtype, mapping.dtype()));
    }

    #[test]
    fn field_lookup() {
        let mapping = sample();
        assert_eq!(mapping.field("a").unwrap().kind(), ScalarKind::Int64);
        assert!(matches!(mapping.field("bob"), Err(Error::Key(_))));
        assert!(matches!(
            DTypeMapping::new([("a", "nope")]),
            Err(Error::DType(_))
        ));
    }

    #[test]
    fn union_and_mutation() {
        let a = sample();
        let b = DTypeMapping::new([("c", "S2"), ("d", "?")]).unwrap();
        let merged = &a | &b;
        assert_eq!(merged.keys().collect::<Vec<_>>(), ["a", "b", "c", "d"]);
        assert_eq!(merged["c"], DType::bytes(2));

        let mut mutable = a.to_mutable();
        assert_eq!(mutable, a);
        mutable.insert("d", ScalarKind::Bool).unwrap();
        mutable.remove("a").unwrap();
        assert!(matches!(mutable.remove("a"), Err(Error::Key(_))));
        assert_eq!(mutable.keys().collect::<Vec<_>>(), ["b", "c", "d"]);
        assert_eq!(mutable.dtype().itemsize(), 8 + 20 + 1);
        assert!(matches!(mutable.hash_code(), Err(Error::Unhashable(_))));
        assert_eq!(mutable.freeze(), mutable);
    }
}
