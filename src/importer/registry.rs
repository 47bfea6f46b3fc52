//! The process-wide load cache.
//!
//! [`ModuleRegistry`] answers "give me the unit named `x`": it returns the cached namespace
//! when one is loaded and otherwise runs the [`Loader`] registered for that name, caching the
//! result. Loads are idempotent by name, failures are returned unchanged and never retried.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::{importer::Namespace, Config, Error, Result};

/// Produces the namespace for a unit name on first import.
///
/// Closures of the form `Fn(&str) -> Result<Namespace>` implement this trait.
///
/// # Examples
///
/// ```rust
/// use nanoutils::importer::{ModuleRegistry, Namespace};
///
/// let registry = ModuleRegistry::new();
/// registry.register_loader("typing", |name: &str| {
///     Ok(Namespace::new(name).with_attr("Any", "typing.Any"))
/// });
/// let typing = registry.import("typing")?;
/// assert!(typing.contains("Any"));
/// # Ok::<(), nanoutils::Error>(())
/// ```
pub trait Loader: Send + Sync {
    /// Builds the namespace for `name`.
    ///
    /// # Errors
    /// Any error is handed back to the caller of [`ModuleRegistry::import`] unchanged.
    fn load(&self, name: &str) -> Result<Namespace>;
}

impl<F> Loader for F
where
    F: Fn(&str) -> Result<Namespace> + Send + Sync,
{
    fn load(&self, name: &str) -> Result<Namespace> {
        self(name)
    }
}

static GLOBAL: OnceLock<Arc<ModuleRegistry>> = OnceLock::new();

/// A cache of loaded namespaces plus the loaders that produce missing ones.
///
/// The registry is the collaborator behind [`crate::importer::LazyImporter::from_name`] and
/// [`crate::importer::LazyImporter::resolve`]. Both use the same instance so that a symbol
/// resolved through a lazy importer and a direct import observe the same namespace.
///
/// # Thread Safety
///
/// All methods take `&self`. Two threads importing the same unit concurrently may both run
/// its loader; the first finished namespace is kept and returned to both.
pub struct ModuleRegistry {
    config: Config,
    modules: DashMap<String, Arc<Namespace>>,
    loaders: DashMap<String, Arc<dyn Loader>>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry {
    /// Creates an empty registry with the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty registry with the given configuration.
    pub fn with_config(config: Config) -> Self {
        ModuleRegistry {
            config,
            modules: DashMap::new(),
            loaders: DashMap::new(),
        }
    }

    /// The process-wide registry.
    pub fn global() -> Arc<ModuleRegistry> {
        GLOBAL.get_or_init(|| Arc::new(ModuleRegistry::new())).clone()
    }

    /// The configuration of this registry.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registers (or replaces) the loader for `name`.
    ///
    /// An already loaded namespace stays cached; the loader only runs for names that are not.
    pub fn register_loader(&self, name: impl Into<String>, loader: impl Loader + 'static) {
        let name = name.into();
        debug!(unit = %name, "registering loader");
        self.loaders.insert(name, Arc::new(loader));
    }

    /// Inserts an already loaded namespace under its own name, replacing any previous entry.
    pub fn insert(&self, namespace: Namespace) -> Arc<Namespace> {
        let namespace = Arc::new(namespace);
        self.modules
            .insert(namespace.name().to_string(), namespace.clone());
        namespace
    }

    /// Returns the loaded namespace `name` without loading it.
    pub fn get(&self, name: &str) -> Option<Arc<Namespace>> {
        self.modules.get(name).map(|entry| entry.value().clone())
    }

    /// Whether `name` is loaded.
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Whether `name` is loaded or has a loader.
    pub fn can_import(&self, name: &str) -> bool {
        self.contains(name) || self.loaders.contains_key(name)
    }

    /// Drops the cached namespace `name`, returning it. Its loader stays registered.
    pub fn remove(&self, name: &str) -> Option<Arc<Namespace>> {
        self.modules.remove(name).map(|(_, namespace)| namespace)
    }

    /// Returns the namespace `name`, loading it on first use.
    ///
    /// With [`Config::import_parents`] set, the parents of a dotted name are imported first
    /// and the child is installed as an attribute of its parent.
    ///
    /// # Errors
    /// Returns [`Error::ModuleNotFound`] when `name` is neither loaded nor has a loader, and
    /// returns loader errors unchanged.
    pub fn import(&self, name: &str) -> Result<Arc<Namespace>> {
        if let Some(namespace) = self.get(name) {
            return Ok(namespace);
        }

        let parent = if self.config.import_parents {
            match name.rsplit_once('.') {
                Some((parent, child)) => Some((self.import(parent)?, child)),
                None => None,
            }
        } else {
            None
        };

        // A parent loader may have inserted the child already
        if let Some(namespace) = self.get(name) {
            return Ok(namespace);
        }

        // Clone the loader out so the map is not borrowed while it runs
        let loader = self
            .loaders
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::ModuleNotFound(name.to_string()))?;

        debug!(unit = %name, "loading");
        let loaded = Arc::new(loader.load(name)?);
        let namespace = self
            .modules
            .entry(name.to_string())
            .or_insert(loaded)
            .value()
            .clone();

        if let Some((parent, child)) = parent {
            trace!(parent = %parent.name(), child, "installing child unit");
            parent.set(child, namespace.clone());
        }

        Ok(namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn import_is_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ModuleRegistry::new();
        let counter = calls.clone();
        registry.register_loader("codecs", move |name: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Namespace::new(name).with_attr("decode", 1_u8))
        });

        let first = registry.import("codecs").unwrap();
        let second = registry.import("codecs").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_unit() {
        let registry = ModuleRegistry::new();
        assert!(matches!(
            registry.import("nope"),
            Err(Error::ModuleNotFound(name)) if name == "nope"
        ));
    }

    #[test]
    fn loader_failure_is_not_retried_or_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ModuleRegistry::new();
        let counter = calls.clone();
        registry.register_loader("broken", move |name: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(Error::Loader {
                name: name.to_string(),
                message: "syntax error".to_string(),
            })
        });

        let error = registry.import("broken").unwrap_err();
        assert!(matches!(error, Error::Loader { ref message, .. } if message == "syntax error"));
        assert!(!registry.contains("broken"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn parents_are_imported_first() {
        let registry = ModuleRegistry::new();
        registry.register_loader("collections", |name: &str| Ok(Namespace::new(name)));
        registry.register_loader("collections.abc", |name: &str| {
            Ok(Namespace::new(name).with_attr("Hashable", "Hashable"))
        });

        let abc = registry.import("collections.abc").unwrap();
        let collections = registry.get("collections").unwrap();
        let child = collections.get_as::<Namespace>("abc").unwrap();
        assert!(Arc::ptr_eq(&abc, &child));
    }

    #[test]
    fn parent_failure_propagates() {
        let registry = ModuleRegistry::new();
        registry.register_loader("orphan.child", |name: &str| Ok(Namespace::new(name)));
        assert!(matches!(
            registry.import("orphan.child"),
            Err(Error::ModuleNotFound(name)) if name == "orphan"
        ));

        let flat = ModuleRegistry::with_config(Config::new().with_import_parents(false));
        flat.register_loader("orphan.child", |name: &str| Ok(Namespace::new(name)));
        assert!(flat.import("orphan.child").is_ok());
    }

    #[test]
    fn inserted_namespaces_shadow_loaders() {
        let registry = ModuleRegistry::new();
        let inserted = registry.insert(Namespace::new("pkg"));
        registry.register_loader("pkg", |_: &str| {
            Err(Error::Error("should not run".to_string()))
        });
        assert!(Arc::ptr_eq(&inserted, &registry.import("pkg").unwrap()));
        assert!(registry.can_import("pkg"));

        assert!(registry.remove("pkg").is_some());
        assert!(registry.import("pkg").is_err());
    }

    #[test]
    fn global_is_shared() {
        let a = ModuleRegistry::global();
        let b = ModuleRegistry::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
