//! Read-only views over data owned elsewhere.
//!
//! Views never copy on construction and never mutate what they look at. Each query reads the
//! current state of the underlying data.
//!
//! # Key Components
//!
//! - [`SequenceView`] - Indexable, sliceable view of a sequence ([`SequenceSource`])
//! - [`Hierarchy`] - A tree whose groups hold sub-groups and leaves
//! - [`RecursiveKeysView`], [`RecursiveValuesView`], [`RecursiveItemsView`] - Depth-first
//!   views of all leaves below a group
//! - [`MemoryGroup`] and [`DirectoryGroup`] - Bundled hierarchies (in-memory, on disk)

mod directory;
mod hierarchy;
mod recursive;
mod sequence;

pub use directory::{DirectoryFile, DirectoryGroup};
pub use hierarchy::{Hierarchy, MemoryDataset, MemoryGroup, MemoryNode, Node};
pub use recursive::{
    DepthFirst, Items, Keys, Projection, RecursiveItemsView, RecursiveKeysView, RecursiveValuesView,
    RecursiveView, Values,
};
pub use sequence::{Iter, SequenceSource, SequenceView};
