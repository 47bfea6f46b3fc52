//! Read-only mappings and dtype descriptions.
//!
//! [`UserMapping`] and [`DTypeMapping`] are the immutable, hashable flavors; each has a
//! mutable counterpart that converts back with `freeze`.

mod dtype;
mod dtype_mapping;
pub(crate) mod user_mapping;

pub use dtype::{ByteOrder, DType, Field, IntoDType, ScalarKind, StructuredDType};
pub use dtype_mapping::{DTypeMapping, MutableDTypeMapping};
pub use user_mapping::{MutableUserMapping, UserMapping};
