//! Assorted helpers: mapping manipulation, version parsing and test cleanup.

mod collections;
mod testing;
mod version;

pub use collections::{group_by_values, split_dict, SplitKeys};
pub use testing::DeleteFinally;
pub use version::VersionInfo;
