//! # nanoutils Prelude
//!
//! The most commonly used types and traits of the crate, for glob imports.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all nanoutils operations
pub use crate::{Error, ErrorKind};

/// The result type used throughout nanoutils
pub use crate::Result;

/// Registry-wide behavior switches
pub use crate::Config;

// ================================================================================================
// Lazy Symbol Resolution
// ================================================================================================

/// Loaded units and the registry that loads them
pub use crate::importer::{downcast, Attr, Loader, ModuleRegistry, Namespace};

/// Lazy resolvers
pub use crate::importer::{LazyImporter, MutableLazyImporter};

/// Dotted-path lookup
pub use crate::importer::get_importable;

// ================================================================================================
// Views
// ================================================================================================

/// Sequence views and their storage trait
pub use crate::view::{SequenceSource, SequenceView};

/// Hierarchies and recursive views
pub use crate::view::{
    DirectoryGroup, Hierarchy, MemoryGroup, Node, RecursiveItemsView, RecursiveKeysView,
    RecursiveValuesView,
};

// ================================================================================================
// Scoped Helpers
// ================================================================================================

/// Attribute patching and error collection
pub use crate::context::{AttrTarget, CatchErrors, SetAttr};

// ================================================================================================
// Containers and Mappings
// ================================================================================================

/// Empty containers
pub use crate::empty::{
    empty_collection, empty_container, empty_mapping, empty_sequence, empty_set,
};

/// Mappings and dtype descriptions
pub use crate::mapping::{
    DType, DTypeMapping, IntoDType, MutableDTypeMapping, MutableUserMapping, UserMapping,
};

// ================================================================================================
// Files and Utilities
// ================================================================================================

/// File containers
pub use crate::file::{FileContainer, FileSource, FileTarget};

/// Validation helpers
pub use crate::schema::{supports_float, supports_int, DefaultValue, Formatter};

/// Miscellaneous helpers
pub use crate::utils::{group_by_values, split_dict, DeleteFinally, SplitKeys, VersionInfo};
