//! Loaded units of code and their attribute tables.

use std::{any::Any, fmt, sync::Arc};

use dashmap::DashMap;

use crate::{Error, Result};

/// A type-erased attribute value.
///
/// Identity matters for attributes: resolving a symbol twice must hand back the same
/// allocation, which callers can check with [`Arc::ptr_eq`].
pub type Attr = Arc<dyn Any + Send + Sync>;

/// Downcasts an attribute to a concrete type.
///
/// # Errors
/// Returns [`Error::Type`] naming `what` when the attribute holds a different type.
pub fn downcast<T: Any + Send + Sync>(attr: Attr, what: &str) -> Result<Arc<T>> {
    attr.downcast::<T>().map_err(|_| {
        Error::Type(format!(
            "'{}' is not of type '{}'",
            what,
            std::any::type_name::<T>()
        ))
    })
}

/// A loaded unit of code: a dotted name plus a table of attributes.
///
/// Namespaces are produced by [`crate::importer::Loader`]s and cached by the
/// [`crate::importer::ModuleRegistry`], which hands them out as `Arc<Namespace>`. The
/// attribute table is concurrent, so a lazy resolver can install resolved symbols while
/// other threads read.
///
/// A namespace can itself be stored as an attribute (`Arc<Namespace>` coerces to
/// [`Attr`]), which is how parent units expose their children.
///
/// # Examples
///
/// ```rust
/// use nanoutils::importer::Namespace;
///
/// let itertools = Namespace::new("itertools").with_attr("chain", "chain-fn");
/// assert!(itertools.contains("chain"));
/// assert_eq!(*itertools.get_as::<&str>("chain")?, "chain-fn");
/// # Ok::<(), nanoutils::Error>(())
/// ```
pub struct Namespace {
    name: String,
    attrs: DashMap<String, Attr>,
}

impl Namespace {
    /// Creates an empty namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Namespace {
            name: name.into(),
            attrs: DashMap::new(),
        }
    }

    /// Builder-style helper adding an attribute by value.
    #[must_use]
    pub fn with_attr(self, name: impl Into<String>, value: impl Any + Send + Sync) -> Self {
        self.attrs.insert(name.into(), Arc::new(value));
        self
    }

    /// Builder-style helper adding an already shared attribute.
    #[must_use]
    pub fn with_attr_arc(self, name: impl Into<String>, value: Attr) -> Self {
        self.attrs.insert(name.into(), value);
        self
    }

    /// The dotted name of this unit.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the attribute `name`, if present.
    pub fn get(&self, name: &str) -> Option<Attr> {
        self.attrs.get(name).map(|entry| entry.value().clone())
    }

    /// Returns the attribute `name` or an [`Error::Attribute`].
    ///
    /// # Errors
    /// Returns [`Error::Attribute`] when the attribute does not exist.
    pub fn getattr(&self, name: &str) -> Result<Attr> {
        self.get(name)
            .ok_or_else(|| Error::attribute(&self.name, name))
    }

    /// Returns the attribute `name` downcast to `T`.
    ///
    /// # Errors
    /// Returns [`Error::Attribute`] when missing and [`Error::Type`] on a type mismatch.
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        downcast(self.getattr(name)?, name)
    }

    /// Whether the attribute `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Installs or replaces an attribute, returning the previous value.
    pub fn set(&self, name: impl Into<String>, value: Attr) -> Option<Attr> {
        self.attrs.insert(name.into(), value)
    }

    /// Removes an attribute, returning it.
    pub fn remove(&self, name: &str) -> Option<Attr> {
        self.attrs.remove(name).map(|(_, value)| value)
    }

    /// All attribute names, sorted.
    pub fn attr_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.attrs.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Whether the namespace has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<module '{}'>", self.name)
    }
}
