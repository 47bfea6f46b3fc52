use strum::{EnumDiscriminants, EnumIter};
use thiserror::Error;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Failures are either precondition violations ([`Error::Type`], [`Error::Unhashable`]),
/// absences ([`Error::Attribute`], [`Error::NotFound`], [`Error::Key`],
/// [`Error::ModuleNotFound`]) or failures passed through from a collaborator (a
/// [`crate::importer::Loader`], a [`crate::view::Hierarchy`] or the filesystem). Nothing in
/// this crate retries or swallows an error.
///
/// # Error Categories
///
/// ## Construction and capability errors
/// - [`Error::Type`] - Wrong-shaped argument, missing capability or failed downcast
/// - [`Error::Unhashable`] - Hashing a value whose identity may change
///
/// ## Lookup errors
/// - [`Error::Attribute`] - Symbol or attribute absent from a namespace
/// - [`Error::ModuleNotFound`] - No loaded unit and no loader for a name
/// - [`Error::NotFound`] - Value absent from a sequence
/// - [`Error::Key`] - Key absent from a mapping
/// - [`Error::IndexOutOfRange`] - Index outside a sequence
///
/// ## Pass-through errors
/// - [`Error::Loader`] - Failure reported by a loader
/// - [`Error::FileError`] - Filesystem I/O errors
///
/// Every variant has a payload-free counterpart in [`ErrorKind`], which is what
/// [`crate::context::CatchErrors::kinds`] matches on.
///
/// # Examples
///
/// ```rust
/// use nanoutils::{importer::{LazyImporter, ModuleRegistry, Namespace}, Error};
/// use std::sync::Arc;
///
/// let registry = Arc::new(ModuleRegistry::new());
/// let module = registry.insert(Namespace::new("pkg"));
/// let importer = LazyImporter::new_in(registry, module, [("Any", "typing")]);
///
/// match importer.resolve("bob") {
///     Err(Error::Attribute { namespace, name }) => {
///         assert_eq!(namespace, "pkg");
///         assert_eq!(name, "bob");
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Error, Debug, EnumDiscriminants)]
#[strum_discriminants(
    name(ErrorKind),
    derive(Hash, EnumIter),
    doc = "Payload-free discriminant of [`Error`], matched by [`crate::context::CatchErrors::kinds`]."
)]
pub enum Error {
    /// An argument had the wrong shape, a required capability is missing, or a
    /// value could not be converted to the requested type.
    ///
    /// Raised synchronously at construction time for invalid arguments, and up front
    /// for capability-gated operations such as reverse traversal of a resource that
    /// cannot enumerate its children backwards.
    #[error("TypeError: {0}")]
    Type(String),

    /// The requested attribute does not exist on the namespace.
    ///
    /// Returned by the lazy resolver when a name is absent from its symbol table, and
    /// when the unit that should define a symbol does not.
    #[error("module '{namespace}' has no attribute '{name}'")]
    Attribute {
        /// Name of the namespace that was searched
        namespace: String,
        /// The attribute that was requested
        name: String,
    },

    /// The value cannot be hashed because its contents may change after construction.
    #[error("unhashable type: '{0}'")]
    Unhashable(&'static str),

    /// No namespace with this name is loaded and no loader is registered for it.
    #[error("no module named '{0}'")]
    ModuleNotFound(String),

    /// A loader failed to produce its namespace.
    ///
    /// Loaders construct this variant themselves; the registry and the resolver hand it
    /// back to the caller unchanged.
    #[error("failed to load '{name}': {message}")]
    Loader {
        /// Name of the unit that failed to load
        name: String,
        /// Loader-provided description of the failure
        message: String,
    },

    /// A sequence search did not find the requested value.
    #[error("{0} is not in sequence")]
    NotFound(String),

    /// An index fell outside the sequence.
    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange {
        /// The requested index
        index: isize,
        /// Length of the sequence at the time of access
        len: usize,
    },

    /// A mapping key was not present.
    #[error("KeyError: {0}")]
    Key(String),

    /// An argument had the right type but an invalid value.
    #[error("ValueError: {0}")]
    Value(String),

    /// A validator rejected the object it was given.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A dtype description could not be parsed.
    #[error("invalid dtype: {0}")]
    DType(String),

    /// File I/O error.
    ///
    /// Wraps standard I/O errors raised while opening, mapping, reading or deleting files,
    /// and while walking directory-backed hierarchies.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// File content was not valid UTF-8.
    #[error("{0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// An out of bound access was attempted on a backend buffer.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}

impl Error {
    /// Returns the payload-free kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::from(self)
    }

    /// Shorthand for [`Error::Attribute`].
    pub(crate) fn attribute(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Error::Attribute {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn attribute_message_names_namespace_and_symbol() {
        let error = Error::attribute("pkg", "bob");
        assert_eq!(error.to_string(), "module 'pkg' has no attribute 'bob'");
        assert_eq!(error.kind(), ErrorKind::Attribute);
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error: Error = io.into();
        assert_eq!(error.kind(), ErrorKind::FileError);
        assert_eq!(error.to_string(), "gone");
    }

    #[test]
    fn every_kind_is_distinct() {
        let kinds: std::collections::HashSet<ErrorKind> = ErrorKind::iter().collect();
        assert_eq!(kinds.len(), ErrorKind::iter().count());
        assert!(kinds.contains(&ErrorKind::Type));
    }
}
