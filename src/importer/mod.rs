//! Lazy symbol resolution over a registry of loadable namespaces.
//!
//! # Key Components
//!
//! - [`Namespace`] - A loaded unit: a dotted name plus a concurrent attribute table
//! - [`Loader`] - Produces a namespace on first import
//! - [`ModuleRegistry`] - The load cache, idempotent by name
//! - [`LazyImporter`] / [`MutableLazyImporter`] - Per-namespace lazy resolvers
//! - [`get_importable`] - Dotted-path lookup through the registry

mod importable;
mod lazy;
mod namespace;
mod registry;

pub use importable::{get_importable, get_importable_in};
pub use lazy::{ImportTable, ImporterState, LazyImporter, MutableLazyImporter};
pub use namespace::{downcast, Attr, Namespace};
pub use registry::{Loader, ModuleRegistry};
