// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # nanoutils
//!
//! Small, reusable building blocks for libraries that load code and data on demand.
//!
//! ## Features
//!
//! - **Lazy symbol resolution** - resolve names from other namespaces on first access and
//!   cache them on the requesting namespace
//! - **Read-only views** - live, non-copying views over sequences and over tree-shaped data
//!   (in memory or a directory on disk)
//! - **Scoped helpers** - temporary attribute patches and collection of expected errors
//! - **Mappings** - insertion-ordered immutable mappings and numpy-style dtype descriptions
//! - **File scaffolding** - read and write line-oriented formats from paths, buffers or
//!   readers
//!
//! ## Quick Start
//!
//! ```rust
//! use nanoutils::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ModuleRegistry::new());
//! registry.insert(Namespace::new("math").with_attr("tau", 6.25_f64));
//! let pkg = registry.insert(Namespace::new("pkg"));
//!
//! let importer = LazyImporter::new_in(registry.clone(), pkg.clone(), [("tau", "math")]);
//! let tau = importer.resolve_as::<f64>("tau")?;
//! assert_eq!(*tau, 6.25);
//! assert!(pkg.contains("tau"));
//! # Ok::<(), nanoutils::Error>(())
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and installs no subscriber: `debug` for namespace
//! loads and file access, `trace` for symbol resolution and attribute patches, `warn` for
//! failed cleanups and broken message templates.
//!
//! ## Development
//!
//! ```bash
//! cargo test
//! cargo bench
//! cargo +nightly fuzz run parse_descriptions  # from ./fuzz
//! ```

#[macro_use]
pub(crate) mod macros;

pub(crate) mod config;
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use nanoutils::prelude::*;
///
/// let view = SequenceView::new(vec![1, 2, 3]);
/// assert_eq!(view.at(-1)?, 3);
/// # Ok::<(), nanoutils::Error>(())
/// ```
pub mod prelude;

/// Lazy symbol resolution over a registry of namespaces.
///
/// A [`importer::LazyImporter`] maps symbol names to the dotted name of the namespace that
/// defines them. The first lookup imports that namespace through the
/// [`importer::ModuleRegistry`], reads the symbol and stores it on the importer's own
/// namespace, so later lookups never reach the importer again.
pub mod importer;

/// Read-only views over sequences and hierarchies.
pub mod view;

/// Temporary attribute patching and error collection.
pub mod context;

/// Immutable empty containers.
pub mod empty;

/// Insertion-ordered mappings and dtype descriptions.
///
/// # Examples
///
/// ```rust
/// use nanoutils::mapping::{DType, DTypeMapping};
///
/// let atoms = DTypeMapping::new([("xyz", "(3,)f8"), ("symbol", "U2"), ("charge", "i8")])?;
/// assert_eq!(atoms.dtype().itemsize(), 24 + 8 + 8);
/// assert_eq!(atoms["symbol"], DType::unicode(2));
/// # Ok::<(), nanoutils::Error>(())
/// ```
pub mod mapping;

/// Line-oriented file containers and content backends.
pub mod file;

/// Value validation helpers.
pub mod schema;

/// Mapping helpers, version parsing and test cleanup.
pub mod utils;

/// `nanoutils` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `nanoutils` Error type
///
/// # Examples
///
/// ```rust
/// use nanoutils::{importer::ModuleRegistry, Error};
///
/// match ModuleRegistry::new().import("missing") {
///     Err(Error::ModuleNotFound(name)) => assert_eq!(name, "missing"),
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
pub use error::{Error, ErrorKind};

/// Behavior switches shared by a [`importer::ModuleRegistry`] and everything resolving
/// through it.
pub use config::Config;
