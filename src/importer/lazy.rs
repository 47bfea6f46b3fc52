//! Lazy symbol resolution.
//!
//! A lazy importer is bound to one [`Namespace`] and a symbol table mapping symbol names to
//! the dotted name of the unit that defines them. Nothing is loaded up front. The first
//! lookup of a symbol imports its defining unit through the [`ModuleRegistry`], reads the
//! symbol from it and installs the value on the bound namespace, so every later lookup is a
//! plain attribute read.
//!
//! Two variants share the resolution logic:
//!
//! - [`LazyImporter`] freezes its table at construction. It is hashable, and cloning it shares
//!   the same frozen table.
//! - [`MutableLazyImporter`] can edit its table after construction. Its identity may change,
//!   so it refuses hashing.
//!
//! # Examples
//!
//! ```rust
//! use nanoutils::importer::{LazyImporter, ModuleRegistry, Namespace};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ModuleRegistry::new());
//! registry.register_loader("itertools", |name: &str| {
//!     Ok(Namespace::new(name).with_attr("chain", 7_u32))
//! });
//!
//! let module = registry.insert(Namespace::new("pkg"));
//! let importer = LazyImporter::new_in(registry.clone(), module.clone(), [("chain", "itertools")]);
//!
//! assert!(!registry.contains("itertools"));
//! assert_eq!(*importer.resolve_as::<u32>("chain")?, 7);
//! assert!(registry.contains("itertools"));
//! assert!(module.contains("chain"));
//! # Ok::<(), nanoutils::Error>(())
//! ```

use std::{
    any::Any,
    collections::{hash_map::DefaultHasher, BTreeMap},
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, OnceLock, RwLock},
};

use serde::{Deserialize, Serialize, Serializer};
use tracing::trace;

use crate::{
    importer::{downcast, Attr, ModuleRegistry, Namespace},
    Error, Result,
};

/// The symbol table of a lazy importer: symbol name to defining unit name.
pub type ImportTable = BTreeMap<String, String>;

/// The serialized form of both lazy importer variants.
///
/// Restoring goes through [`LazyImporter::from_name`], so the bound namespace is looked up
/// (and possibly loaded) again by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImporterState {
    /// Dotted name of the bound namespace
    pub module: String,
    /// The symbol table
    pub imports: ImportTable,
}

fn collect_table<I, K, V>(imports: I) -> ImportTable
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    imports
        .into_iter()
        .map(|(name, source)| (name.into(), source.into()))
        .collect()
}

/// Imports the unit defining `name`, reads the symbol and installs it on `module`.
fn resolve_symbol(
    registry: &ModuleRegistry,
    module: &Namespace,
    source: Option<String>,
    name: &str,
) -> Result<Attr> {
    let Some(source) = source else {
        return Err(Error::attribute(module.name(), name));
    };

    let unit = registry.import(&source)?;
    let value = unit
        .get(name)
        .ok_or_else(|| Error::attribute(unit.name(), name))?;

    trace!(module = %module.name(), symbol = name, source = %source, "resolved lazy symbol");
    module.set(name, value.clone());
    Ok(value)
}

fn fmt_importer(
    f: &mut fmt::Formatter<'_>,
    kind: &str,
    module: &Namespace,
    imports: &ImportTable,
    max_entries: usize,
) -> fmt::Result {
    write!(f, "{kind}(module={}, imports={{", module.name())?;
    for (i, (name, source)) in imports.iter().take(max_entries).enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "'{name}': '{source}'")?;
    }
    if imports.len() > max_entries {
        f.write_str(if max_entries == 0 { "..." } else { ", ..." })?;
    }
    f.write_str("})")
}

/// A lazy symbol resolver with a frozen symbol table.
///
/// # Equality and hashing
///
/// Two importers are equal when they are bound to the same namespace (by pointer) and their
/// tables are equal; a [`MutableLazyImporter`] compares with a `LazyImporter` the same way.
/// The hash combines the namespace pointer with the table contents, is computed on first use
/// and cached.
///
/// # Cloning
///
/// `clone` shares the frozen table, see [`LazyImporter::same_table`].
#[derive(Clone)]
pub struct LazyImporter {
    registry: Arc<ModuleRegistry>,
    module: Arc<Namespace>,
    imports: Arc<ImportTable>,
    hash: OnceLock<u64>,
}

impl LazyImporter {
    /// Creates an importer for `module` resolving through the global registry.
    ///
    /// `imports` accepts any iterable of `(symbol, unit)` pairs, including maps.
    pub fn new<I, K, V>(module: Arc<Namespace>, imports: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new_in(ModuleRegistry::global(), module, imports)
    }

    /// Creates an importer for `module` resolving through `registry`.
    pub fn new_in<I, K, V>(
        registry: Arc<ModuleRegistry>,
        module: Arc<Namespace>,
        imports: I,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        LazyImporter {
            registry,
            module,
            imports: Arc::new(collect_table(imports)),
            hash: OnceLock::new(),
        }
    }

    /// Creates an importer for the unit `name`, loading it through the global registry.
    ///
    /// # Errors
    /// Returns the registry's error unchanged when `name` cannot be loaded.
    pub fn from_name<I, K, V>(name: &str, imports: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_name_in(ModuleRegistry::global(), name, imports)
    }

    /// Like [`LazyImporter::from_name`], with an explicit registry.
    ///
    /// # Errors
    /// Returns the registry's error unchanged when `name` cannot be loaded.
    pub fn from_name_in<I, K, V>(
        registry: Arc<ModuleRegistry>,
        name: &str,
        imports: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let module = registry.import(name)?;
        Ok(Self::new_in(registry, module, imports))
    }

    /// Restores an importer from its serialized state via the global registry.
    ///
    /// # Errors
    /// Returns the registry's error when the bound unit cannot be loaded.
    pub fn from_state(state: ImporterState) -> Result<Self> {
        Self::from_state_in(ModuleRegistry::global(), state)
    }

    /// Restores an importer from its serialized state via `registry`.
    ///
    /// # Errors
    /// Returns the registry's error when the bound unit cannot be loaded.
    pub fn from_state_in(registry: Arc<ModuleRegistry>, state: ImporterState) -> Result<Self> {
        Self::from_name_in(registry, &state.module, state.imports)
    }

    /// The bound namespace.
    pub fn module(&self) -> &Arc<Namespace> {
        &self.module
    }

    /// The registry used for resolution.
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// The frozen symbol table.
    pub fn imports(&self) -> &ImportTable {
        &self.imports
    }

    /// Whether `self` and `other` share the same table allocation.
    pub fn same_table(&self, other: &LazyImporter) -> bool {
        Arc::ptr_eq(&self.imports, &other.imports)
    }

    /// Resolves `name` through the symbol table and installs it on the namespace.
    ///
    /// # Errors
    /// - [`Error::Attribute`] naming the bound namespace when `name` is not in the table
    /// - the registry's error when the defining unit cannot be loaded
    /// - [`Error::Attribute`] naming the defining unit when it lacks `name`
    pub fn resolve(&self, name: &str) -> Result<Attr> {
        let source = self.imports.get(name).cloned();
        resolve_symbol(&self.registry, &self.module, source, name)
    }

    /// Resolves `name` and downcasts it to `T`.
    ///
    /// # Errors
    /// As [`LazyImporter::resolve`], plus [`Error::Type`] on a type mismatch.
    pub fn resolve_as<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        downcast(self.resolve(name)?, name)
    }

    /// Reads `name` from the namespace, resolving it lazily when absent.
    ///
    /// # Errors
    /// As [`LazyImporter::resolve`] when the attribute is not yet installed.
    pub fn getattr(&self, name: &str) -> Result<Attr> {
        match self.module.get(name) {
            Some(value) => Ok(value),
            None => self.resolve(name),
        }
    }

    /// The cached hash code.
    pub fn hash_code(&self) -> u64 {
        *self.hash.get_or_init(|| {
            let mut hasher = DefaultHasher::new();
            (Arc::as_ptr(&self.module) as usize).hash(&mut hasher);
            self.imports.hash(&mut hasher);
            hasher.finish()
        })
    }

    /// The serializable state of this importer.
    pub fn state(&self) -> ImporterState {
        ImporterState {
            module: self.module.name().to_string(),
            imports: (*self.imports).clone(),
        }
    }
}

impl Hash for LazyImporter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl PartialEq for LazyImporter {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.module, &other.module)
            && (self.same_table(other) || self.imports == other.imports)
    }
}

impl Eq for LazyImporter {}

impl PartialEq<MutableLazyImporter> for LazyImporter {
    fn eq(&self, other: &MutableLazyImporter) -> bool {
        Arc::ptr_eq(&self.module, &other.module)
            && with_read!(other.imports, |table: &ImportTable| *table == *self.imports)
    }
}

impl fmt::Display for LazyImporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_importer(
            f,
            "LazyImporter",
            &self.module,
            &self.imports,
            self.registry.config().repr_max_entries,
        )
    }
}

impl fmt::Debug for LazyImporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for LazyImporter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.state().serialize(serializer)
    }
}

/// A lazy symbol resolver whose symbol table can be edited after construction.
///
/// `clone` is a shallow copy: both handles share one table and see each other's edits. Use
/// [`MutableLazyImporter::deep_copy`] for an independent table. The type is deliberately not
/// `Hash`; [`MutableLazyImporter::hash_code`] always fails.
///
/// # Examples
///
/// ```rust
/// use nanoutils::importer::{ModuleRegistry, MutableLazyImporter, Namespace};
/// use std::sync::Arc;
///
/// let registry = Arc::new(ModuleRegistry::new());
/// let module = registry.insert(Namespace::new("pkg"));
/// let importer = MutableLazyImporter::new_in(registry, module, [("Any", "typing")]);
///
/// let shallow = importer.clone();
/// shallow.insert("chain", "itertools");
/// assert_eq!(importer.imports().len(), 2);
/// assert!(importer.hash_code().is_err());
/// ```
#[derive(Clone)]
pub struct MutableLazyImporter {
    registry: Arc<ModuleRegistry>,
    module: Arc<Namespace>,
    imports: Arc<RwLock<ImportTable>>,
}

impl MutableLazyImporter {
    /// Creates a mutable importer for `module` resolving through the global registry.
    pub fn new<I, K, V>(module: Arc<Namespace>, imports: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new_in(ModuleRegistry::global(), module, imports)
    }

    /// Creates a mutable importer for `module` resolving through `registry`.
    pub fn new_in<I, K, V>(
        registry: Arc<ModuleRegistry>,
        module: Arc<Namespace>,
        imports: I,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        MutableLazyImporter {
            registry,
            module,
            imports: Arc::new(RwLock::new(collect_table(imports))),
        }
    }

    /// Creates a mutable importer for the unit `name` via the global registry.
    ///
    /// # Errors
    /// Returns the registry's error unchanged when `name` cannot be loaded.
    pub fn from_name<I, K, V>(name: &str, imports: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_name_in(ModuleRegistry::global(), name, imports)
    }

    /// Like [`MutableLazyImporter::from_name`], with an explicit registry.
    ///
    /// # Errors
    /// Returns the registry's error unchanged when `name` cannot be loaded.
    pub fn from_name_in<I, K, V>(
        registry: Arc<ModuleRegistry>,
        name: &str,
        imports: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let module = registry.import(name)?;
        Ok(Self::new_in(registry, module, imports))
    }

    /// Restores an importer from its serialized state via the global registry.
    ///
    /// # Errors
    /// Returns the registry's error when the bound unit cannot be loaded.
    pub fn from_state(state: ImporterState) -> Result<Self> {
        Self::from_state_in(ModuleRegistry::global(), state)
    }

    /// Restores an importer from its serialized state via `registry`.
    ///
    /// # Errors
    /// Returns the registry's error when the bound unit cannot be loaded.
    pub fn from_state_in(registry: Arc<ModuleRegistry>, state: ImporterState) -> Result<Self> {
        Self::from_name_in(registry, &state.module, state.imports)
    }

    /// The bound namespace.
    pub fn module(&self) -> &Arc<Namespace> {
        &self.module
    }

    /// The registry used for resolution.
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// A snapshot of the current symbol table.
    pub fn imports(&self) -> ImportTable {
        read_lock!(self.imports).clone()
    }

    /// Replaces the symbol table with a copy of `imports`.
    pub fn set_imports<I, K, V>(&self, imports: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let table = collect_table(imports);
        *write_lock!(self.imports) = table;
    }

    /// Adds or replaces one entry, returning the previous unit name.
    pub fn insert(&self, name: impl Into<String>, source: impl Into<String>) -> Option<String> {
        write_lock!(self.imports).insert(name.into(), source.into())
    }

    /// Removes one entry, returning its unit name.
    pub fn remove(&self, name: &str) -> Option<String> {
        write_lock!(self.imports).remove(name)
    }

    /// Edits the table in place.
    pub fn with_imports_mut<R>(&self, edit: impl FnOnce(&mut ImportTable) -> R) -> R {
        with_write!(self.imports, edit)
    }

    /// Whether `self` and `other` share the same table.
    pub fn shares_table_with(&self, other: &MutableLazyImporter) -> bool {
        Arc::ptr_eq(&self.imports, &other.imports)
    }

    /// Returns a copy with its own table.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        MutableLazyImporter {
            registry: self.registry.clone(),
            module: self.module.clone(),
            imports: Arc::new(RwLock::new(self.imports())),
        }
    }

    /// Freezes the current table into a [`LazyImporter`].
    pub fn freeze(&self) -> LazyImporter {
        LazyImporter::new_in(self.registry.clone(), self.module.clone(), self.imports())
    }

    /// See [`LazyImporter::resolve`]. The table is read at call time.
    ///
    /// # Errors
    /// As [`LazyImporter::resolve`].
    pub fn resolve(&self, name: &str) -> Result<Attr> {
        let source = read_lock!(self.imports).get(name).cloned();
        resolve_symbol(&self.registry, &self.module, source, name)
    }

    /// See [`LazyImporter::resolve_as`].
    ///
    /// # Errors
    /// As [`LazyImporter::resolve_as`].
    pub fn resolve_as<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        downcast(self.resolve(name)?, name)
    }

    /// See [`LazyImporter::getattr`].
    ///
    /// # Errors
    /// As [`LazyImporter::resolve`].
    pub fn getattr(&self, name: &str) -> Result<Attr> {
        match self.module.get(name) {
            Some(value) => Ok(value),
            None => self.resolve(name),
        }
    }

    /// Always fails: the table can change, so no stable hash exists.
    ///
    /// # Errors
    /// Always returns [`Error::Unhashable`].
    pub fn hash_code(&self) -> Result<u64> {
        Err(Error::Unhashable("MutableLazyImporter"))
    }

    /// The serializable state of this importer.
    pub fn state(&self) -> ImporterState {
        ImporterState {
            module: self.module.name().to_string(),
            imports: self.imports(),
        }
    }
}

impl PartialEq for MutableLazyImporter {
    fn eq(&self, other: &Self) -> bool {
        if !Arc::ptr_eq(&self.module, &other.module) {
            return false;
        }
        if self.shares_table_with(other) {
            return true;
        }
        let theirs = other.imports();
        with_read!(self.imports, |table: &ImportTable| *table == theirs)
    }
}

impl PartialEq<LazyImporter> for MutableLazyImporter {
    fn eq(&self, other: &LazyImporter) -> bool {
        other == self
    }
}

impl fmt::Display for MutableLazyImporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let imports = self.imports();
        fmt_importer(
            f,
            "MutableLazyImporter",
            &self.module,
            &imports,
            self.registry.config().repr_max_entries,
        )
    }
}

impl fmt::Debug for MutableLazyImporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for MutableLazyImporter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.state().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use std::collections::hash_map::DefaultHasher;

    fn setup() -> (Arc<ModuleRegistry>, Arc<Namespace>) {
        let registry = Arc::new(ModuleRegistry::new());
        registry.register_loader("typing", |name: &str| {
            Ok(Namespace::new(name).with_attr("Any", "typing.Any"))
        });
        registry.register_loader("itertools", |name: &str| {
            Ok(Namespace::new(name).with_attr("chain", "itertools.chain"))
        });
        let module = registry.insert(Namespace::new("pkg"));
        (registry, module)
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn resolve_installs_identical_value() {
        let (registry, module) = setup();
        let importer =
            LazyImporter::new_in(registry.clone(), module.clone(), [("Any", "typing")]);

        let value = importer.resolve("Any").unwrap();
        let direct = registry.import("typing").unwrap().get("Any").unwrap();
        assert!(Arc::ptr_eq(&value, &direct));
        assert!(Arc::ptr_eq(&module.get("Any").unwrap(), &direct));
    }

    #[test]
    fn unknown_symbol_names_the_namespace() {
        let (registry, module) = setup();
        let importer = LazyImporter::new_in(registry, module, [("Any", "typing")]);
        let error = importer.resolve("bob").unwrap_err();
        assert_eq!(error.to_string(), "module 'pkg' has no attribute 'bob'");
    }

    #[test]
    fn defining_unit_without_symbol() {
        let (registry, module) = setup();
        let importer = LazyImporter::new_in(registry, module, [("Missing", "typing")]);
        let error = importer.resolve("Missing").unwrap_err();
        assert!(matches!(error, Error::Attribute { ref namespace, .. } if namespace == "typing"));
    }

    #[test]
    fn loader_errors_propagate() {
        let (registry, module) = setup();
        let importer = LazyImporter::new_in(registry, module, [("x", "nowhere")]);
        assert!(matches!(importer.resolve("x"), Err(Error::ModuleNotFound(_))));
    }

    #[test]
    fn getattr_prefers_direct_attributes() {
        let (registry, module) = setup();
        module.set("Any", Arc::new(1_u8));
        let importer = LazyImporter::new_in(registry.clone(), module, [("Any", "typing")]);
        assert_eq!(*downcast::<u8>(importer.getattr("Any").unwrap(), "Any").unwrap(), 1);
        assert!(!registry.contains("typing"));
    }

    #[test]
    fn resolve_as_type_mismatch() {
        let (registry, module) = setup();
        let importer = LazyImporter::new_in(registry, module, [("Any", "typing")]);
        assert!(matches!(importer.resolve_as::<u64>("Any"), Err(Error::Type(_))));
        assert_eq!(*importer.resolve_as::<&str>("Any").unwrap(), "typing.Any");
    }

    #[test]
    fn hash_is_stable_across_clones() {
        let (registry, module) = setup();
        let importer = LazyImporter::new_in(registry, module, [("Any", "typing")]);
        let copy = importer.clone();
        assert!(importer.same_table(&copy));
        assert_eq!(importer, copy);
        assert_eq!(hash_of(&importer), hash_of(&copy));
    }

    #[test]
    fn equality_depends_on_namespace_identity() {
        let (registry, module) = setup();
        let other = Arc::new(Namespace::new("pkg"));
        let a = LazyImporter::new_in(registry.clone(), module.clone(), [("Any", "typing")]);
        let b = LazyImporter::new_in(registry.clone(), module, [("Any", "typing")]);
        let c = LazyImporter::new_in(registry, other, [("Any", "typing")]);
        assert_eq!(a, b);
        assert!(!a.same_table(&b));
        assert_ne!(a, c);
    }

    #[test]
    fn mutable_variant() {
        let (registry, module) = setup();
        let importer = MutableLazyImporter::new_in(registry.clone(), module.clone(), [("Any", "typing")]);
        assert!(matches!(importer.hash_code(), Err(Error::Unhashable("MutableLazyImporter"))));

        let frozen = LazyImporter::new_in(registry, module, [("Any", "typing")]);
        assert!(importer == frozen);
        assert!(frozen == importer);

        let shallow = importer.clone();
        let deep = importer.deep_copy();
        shallow.insert("chain", "itertools");
        assert!(importer.shares_table_with(&shallow));
        assert_eq!(importer.imports().len(), 2);
        assert_eq!(deep.imports().len(), 1);
        assert!(importer != frozen);

        assert!(importer.resolve("chain").is_ok());
        assert_eq!(importer.remove("chain").as_deref(), Some("itertools"));
        importer.with_imports_mut(|table| table.clear());
        assert!(matches!(importer.resolve("Any"), Err(Error::Attribute { .. })));
    }

    #[test]
    fn display_caps_entries() {
        let (registry, module) = setup();
        let importer = LazyImporter::new_in(
            registry,
            module,
            [("Any", "typing"), ("chain", "itertools"), ("zip", "builtins")],
        );
        assert_eq!(
            importer.to_string(),
            "LazyImporter(module=pkg, imports={'Any': 'typing', 'chain': 'itertools', ...})"
        );

        let registry = Arc::new(ModuleRegistry::with_config(Config::new().with_repr_max_entries(5)));
        let module = Arc::new(Namespace::new("pkg"));
        let importer = MutableLazyImporter::new_in(registry, module, [("Any", "typing")]);
        assert_eq!(
            importer.to_string(),
            "MutableLazyImporter(module=pkg, imports={'Any': 'typing'})"
        );
    }

    #[test]
    fn state_roundtrip() {
        let (registry, module) = setup();
        let importer = LazyImporter::new_in(registry.clone(), module, [("Any", "typing")]);
        let json = serde_json::to_string(&importer).unwrap();
        let state: ImporterState = serde_json::from_str(&json).unwrap();
        assert_eq!(state.module, "pkg");

        let restored = LazyImporter::from_state_in(registry, state).unwrap();
        assert_eq!(restored, importer);
    }
}
