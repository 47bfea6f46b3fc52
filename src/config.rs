//! Configuration shared by the registry and the lazy resolvers.
//!
//! [`Config`] is deliberately small: it controls how dotted unit names are imported and how
//! much of a symbol table the resolvers print.

/// Library-wide configuration.
///
/// A [`crate::importer::ModuleRegistry`] owns one `Config`; every resolver bound to that
/// registry reads it.
///
/// # Examples
///
/// ```rust
/// use nanoutils::{importer::ModuleRegistry, Config};
///
/// let config = Config::new().with_repr_max_entries(4).with_import_parents(false);
/// let registry = ModuleRegistry::with_config(config);
/// assert_eq!(registry.config().repr_max_entries, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of symbol-table entries rendered by `Display` before eliding the rest (default: 2).
    pub repr_max_entries: usize,

    /// Import the parent units of a dotted name before the name itself (default: true).
    ///
    /// With this set, importing `a.b.c` imports `a`, then `a.b`, then `a.b.c`, and a failure
    /// of any parent is returned without attempting the child.
    pub import_parents: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            repr_max_entries: 2,
            import_parents: true,
        }
    }
}

impl Config {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many symbol-table entries `Display` prints.
    #[must_use]
    pub fn with_repr_max_entries(mut self, max: usize) -> Self {
        self.repr_max_entries = max;
        self
    }

    /// Enables or disables importing parent units of dotted names.
    #[must_use]
    pub fn with_import_parents(mut self, enable: bool) -> Self {
        self.import_parents = enable;
        self
    }
}
