//! Hierarchical resources: the [`Hierarchy`] trait and an in-memory tree.

use std::{
    collections::BTreeMap,
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, RwLock},
};

use crate::{
    mapping::DType,
    view::{RecursiveItemsView, RecursiveKeysView, RecursiveValuesView},
    Error, Result,
};

/// One child of a group: either a nested group or a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<G, L> {
    /// A nested group
    Group(G),
    /// A leaf entry
    Leaf(L),
}

/// A tree-shaped resource whose groups can be walked by the recursive views.
///
/// `children` must return entries in a stable order; the recursive views yield leaves in that
/// order. Resources that can enumerate children backwards report it through
/// `supports_reverse`, which gates reverse traversal.
pub trait Hierarchy: Sized {
    /// The leaf type.
    type Leaf;

    /// Direct children of this group, in stable order.
    ///
    /// # Errors
    /// Implementations propagate their own access failures.
    fn children(&self) -> Result<Vec<Node<Self, Self::Leaf>>>;

    /// The full name of a leaf.
    fn leaf_name(leaf: &Self::Leaf) -> String;

    /// Whether children can be enumerated in reverse order.
    fn supports_reverse(&self) -> bool {
        true
    }

    /// Direct children in reverse order.
    ///
    /// # Errors
    /// Returns [`Error::Type`] when the resource does not support reverse order.
    fn children_rev(&self) -> Result<Vec<Node<Self, Self::Leaf>>> {
        if !self.supports_reverse() {
            return Err(Error::Type(
                "reverse iteration requires a resource that supports reverse ordering".to_string(),
            ));
        }
        let mut children = self.children()?;
        children.reverse();
        Ok(children)
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(Error::Value(format!("invalid member name: '{name}'")));
    }
    Ok(())
}

struct GroupInner {
    path: String,
    reversible: bool,
    children: RwLock<BTreeMap<String, MemoryNode>>,
}

/// A group of an in-memory tree.
///
/// Handles are cheap to clone and share the same group. Children are kept in name order.
/// Groups built with [`MemoryGroup::legacy`] cannot enumerate children in reverse, which makes
/// reverse traversal fail.
///
/// # Examples
///
/// ```rust
/// use nanoutils::{mapping::DType, view::MemoryGroup};
///
/// let root = MemoryGroup::new();
/// root.create_dataset("dset1", [10], DType::parse("f8")?)?;
/// let a = root.create_group("a")?;
/// a.create_dataset("dset2", [10], DType::parse("f8")?)?;
///
/// let keys = root.keys_view();
/// assert_eq!(keys.to_vec()?, ["/a/dset2", "/dset1"]);
/// # Ok::<(), nanoutils::Error>(())
/// ```
#[derive(Clone)]
pub struct MemoryGroup {
    inner: Arc<GroupInner>,
}

struct DatasetInner {
    path: String,
    shape: Vec<usize>,
    dtype: DType,
}

/// A leaf of an in-memory tree: a named, shaped, typed dataset.
///
/// Equality and hashing are by identity: two handles are equal when they refer to the same
/// dataset.
#[derive(Clone)]
pub struct MemoryDataset {
    inner: Arc<DatasetInner>,
}

/// A group-or-dataset handle of an in-memory tree.
pub type MemoryNode = Node<MemoryGroup, MemoryDataset>;

impl Default for MemoryGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGroup {
    /// Creates an empty root group named `/`.
    pub fn new() -> Self {
        Self::with_path("/".to_string(), true)
    }

    /// Creates an empty root group whose tree cannot be walked in reverse.
    pub fn legacy() -> Self {
        Self::with_path("/".to_string(), false)
    }

    fn with_path(path: String, reversible: bool) -> Self {
        MemoryGroup {
            inner: Arc::new(GroupInner {
                path,
                reversible,
                children: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    fn insert(&self, name: &str, node: MemoryNode) -> Result<()> {
        check_name(name)?;
        let mut children = write_lock!(self.inner.children);
        if children.contains_key(name) {
            return Err(Error::Value(format!(
                "name already exists: '{}'",
                child_path(&self.inner.path, name)
            )));
        }
        children.insert(name.to_string(), node);
        Ok(())
    }

    /// Full path of this group.
    pub fn name(&self) -> &str {
        &self.inner.path
    }

    /// Creates a sub-group.
    ///
    /// # Errors
    /// Returns [`Error::Value`] for an invalid or already used name.
    pub fn create_group(&self, name: &str) -> Result<MemoryGroup> {
        let group = Self::with_path(child_path(&self.inner.path, name), self.inner.reversible);
        self.insert(name, Node::Group(group.clone()))?;
        Ok(group)
    }

    /// Creates a dataset.
    ///
    /// # Errors
    /// Returns [`Error::Value`] for an invalid or already used name.
    pub fn create_dataset(
        &self,
        name: &str,
        shape: impl Into<Vec<usize>>,
        dtype: DType,
    ) -> Result<MemoryDataset> {
        let dataset = MemoryDataset {
            inner: Arc::new(DatasetInner {
                path: child_path(&self.inner.path, name),
                shape: shape.into(),
                dtype,
            }),
        };
        self.insert(name, Node::Leaf(dataset.clone()))?;
        Ok(dataset)
    }

    /// Returns the direct child `name`.
    pub fn get(&self, name: &str) -> Option<MemoryNode> {
        read_lock!(self.inner.children).get(name).cloned()
    }

    /// Removes and returns the direct child `name`.
    pub fn remove(&self, name: &str) -> Option<MemoryNode> {
        write_lock!(self.inner.children).remove(name)
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        read_lock!(self.inner.children).len()
    }

    /// Whether the group has no direct children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A recursive view of all dataset names below this group.
    pub fn keys_view(&self) -> RecursiveKeysView<MemoryGroup> {
        RecursiveKeysView::new(self.clone())
    }

    /// A recursive view of all datasets below this group.
    pub fn values_view(&self) -> RecursiveValuesView<MemoryGroup> {
        RecursiveValuesView::new(self.clone())
    }

    /// A recursive view of all `(name, dataset)` pairs below this group.
    pub fn items_view(&self) -> RecursiveItemsView<MemoryGroup> {
        RecursiveItemsView::new(self.clone())
    }
}

impl Hierarchy for MemoryGroup {
    type Leaf = MemoryDataset;

    fn children(&self) -> Result<Vec<MemoryNode>> {
        Ok(read_lock!(self.inner.children).values().cloned().collect())
    }

    fn leaf_name(leaf: &MemoryDataset) -> String {
        leaf.name().to_string()
    }

    fn supports_reverse(&self) -> bool {
        self.inner.reversible
    }
}

impl PartialEq for MemoryGroup {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for MemoryGroup {}

impl fmt::Debug for MemoryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<group \"{}\" ({} members)>", self.inner.path, self.len())
    }
}

impl MemoryDataset {
    /// Full path of this dataset.
    pub fn name(&self) -> &str {
        &self.inner.path
    }

    /// Dimensions of the dataset.
    pub fn shape(&self) -> &[usize] {
        &self.inner.shape
    }

    /// Element type of the dataset.
    pub fn dtype(&self) -> &DType {
        &self.inner.dtype
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.inner.shape.iter().product()
    }
}

impl PartialEq for MemoryDataset {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for MemoryDataset {}

impl Hash for MemoryDataset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(Arc::as_ptr(&self.inner) as usize);
    }
}

impl fmt::Debug for MemoryDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self.inner.shape.as_slice() {
            [single] => format!("({single},)"),
            dims => format!(
                "({})",
                dims.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
            ),
        };
        let name = self.inner.path.rsplit('/').next().unwrap_or_default();
        write!(
            f,
            "<dataset \"{name}\": shape {shape}, type \"{}\">",
            self.inner.dtype.str()
        )
    }
}

impl MemoryNode {
    /// The full path of the node.
    pub fn name(&self) -> &str {
        match self {
            Node::Group(group) => group.name(),
            Node::Leaf(dataset) => dataset.name(),
        }
    }

    fn group(&self) -> Result<&MemoryGroup> {
        match self {
            Node::Group(group) => Ok(group),
            Node::Leaf(dataset) => Err(Error::Type(format!(
                "Expected a group, not a dataset: '{}'",
                dataset.name()
            ))),
        }
    }

    /// A recursive keys view when this node is a group.
    ///
    /// # Errors
    /// Returns [`Error::Type`] when the node is a dataset.
    pub fn keys_view(&self) -> Result<RecursiveKeysView<MemoryGroup>> {
        self.group().map(MemoryGroup::keys_view)
    }

    /// A recursive values view when this node is a group.
    ///
    /// # Errors
    /// Returns [`Error::Type`] when the node is a dataset.
    pub fn values_view(&self) -> Result<RecursiveValuesView<MemoryGroup>> {
        self.group().map(MemoryGroup::values_view)
    }

    /// A recursive items view when this node is a group.
    ///
    /// # Errors
    /// Returns [`Error::Type`] when the node is a dataset.
    pub fn items_view(&self) -> Result<RecursiveItemsView<MemoryGroup>> {
        self.group().map(MemoryGroup::items_view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f8() -> DType {
        DType::parse("f8").unwrap()
    }

    #[test]
    fn paths_and_order() {
        let root = MemoryGroup::new();
        let b = root.create_group("b").unwrap();
        root.create_dataset("a", [3], f8()).unwrap();
        let inner = b.create_dataset("c", [2, 2], f8()).unwrap();

        assert_eq!(b.name(), "/b");
        assert_eq!(inner.name(), "/b/c");
        assert_eq!(inner.size(), 4);

        let names: Vec<String> = root
            .children()
            .unwrap()
            .iter()
            .map(|node| node.name().to_string())
            .collect();
        assert_eq!(names, ["/a", "/b"]);

        let reversed: Vec<String> = root
            .children_rev()
            .unwrap()
            .iter()
            .map(|node| node.name().to_string())
            .collect();
        assert_eq!(reversed, ["/b", "/a"]);
    }

    #[test]
    fn invalid_and_duplicate_names() {
        let root = MemoryGroup::new();
        root.create_group("a").unwrap();
        assert!(matches!(root.create_group("a"), Err(Error::Value(_))));
        assert!(matches!(root.create_dataset("x/y", [1], f8()), Err(Error::Value(_))));
        assert!(matches!(root.create_group(""), Err(Error::Value(_))));
    }

    #[test]
    fn legacy_groups_refuse_reverse() {
        let root = MemoryGroup::legacy();
        let child = root.create_group("a").unwrap();
        assert!(!child.supports_reverse());
        assert!(matches!(root.children_rev(), Err(Error::Type(_))));
    }

    #[test]
    fn dataset_nodes_have_no_views() {
        let root = MemoryGroup::new();
        root.create_dataset("dset", [10], f8()).unwrap();
        let node = root.get("dset").unwrap();
        assert!(matches!(node.keys_view(), Err(Error::Type(_))));
        assert!(matches!(node.values_view(), Err(Error::Type(_))));

        root.create_group("grp").unwrap();
        assert!(root.get("grp").unwrap().items_view().is_ok());
    }

    #[test]
    fn dataset_identity_and_debug() {
        let root = MemoryGroup::new();
        let dset = root.create_dataset("dset3", [10], f8()).unwrap();
        let same = match root.get("dset3").unwrap() {
            Node::Leaf(dataset) => dataset,
            Node::Group(_) => unreachable!(),
        };
        assert_eq!(dset, same);
        assert_eq!(format!("{dset:?}"), "<dataset \"dset3\": shape (10,), type \"<f8\">");

        assert!(root.remove("dset3").is_some());
        assert!(root.is_empty());
    }
}
