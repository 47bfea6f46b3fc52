//! Recursive keys, values and items views over a [`Hierarchy`].
//!
//! The views flatten a tree into its leaves, depth-first. Children are visited in the order
//! the resource reports them and a sub-group is fully walked before its later siblings.
//! Nothing is cached: every query walks the resource again, so the views reflect its current
//! state and every query can fail with the resource's own error.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    hash::Hash,
    marker::PhantomData,
};

use serde::{Serialize, Serializer};

use crate::{
    view::{Hierarchy, Node},
    Result,
};

/// Selects what a [`RecursiveView`] yields for each leaf.
pub trait Projection<H: Hierarchy> {
    /// The yielded item.
    type Item;

    /// Type name used by `Debug`.
    const NAME: &'static str;

    /// Maps a leaf to the yielded item.
    fn project(leaf: H::Leaf) -> Self::Item;
}

/// Yields leaf names.
#[derive(Debug, Clone, Copy)]
pub struct Keys;

/// Yields leaves.
#[derive(Debug, Clone, Copy)]
pub struct Values;

/// Yields `(name, leaf)` pairs.
#[derive(Debug, Clone, Copy)]
pub struct Items;

impl<H: Hierarchy> Projection<H> for Keys {
    type Item = String;
    const NAME: &'static str = "RecursiveKeysView";

    fn project(leaf: H::Leaf) -> String {
        H::leaf_name(&leaf)
    }
}

impl<H: Hierarchy> Projection<H> for Values {
    type Item = H::Leaf;
    const NAME: &'static str = "RecursiveValuesView";

    fn project(leaf: H::Leaf) -> H::Leaf {
        leaf
    }
}

impl<H: Hierarchy> Projection<H> for Items {
    type Item = (String, H::Leaf);
    const NAME: &'static str = "RecursiveItemsView";

    fn project(leaf: H::Leaf) -> (String, H::Leaf) {
        (H::leaf_name(&leaf), leaf)
    }
}

/// A read-only, recursive view over the leaves of a group.
///
/// Use the [`RecursiveKeysView`], [`RecursiveValuesView`] and [`RecursiveItemsView`] aliases.
///
/// - `len` and `contains` walk the whole tree.
/// - Set operations materialize the view into a [`HashSet`] first.
/// - Equality compares materialized contents: sets for keys and items, multisets for values.
///   [`RecursiveView::try_eq`] reports traversal errors, `==` treats them as inequality.
/// - The views are neither `Clone` nor `Hash`, and serialization always fails.
///
/// # Examples
///
/// ```rust
/// use nanoutils::{mapping::DType, view::{MemoryGroup, RecursiveKeysView}};
///
/// let root = MemoryGroup::new();
/// let f8 = DType::parse("f8")?;
/// root.create_dataset("dset1", [10], f8.clone())?;
/// let a = root.create_group("a")?;
/// a.create_dataset("dset2", [10], f8.clone())?;
/// a.create_group("b")?.create_dataset("dset3", [10], f8)?;
///
/// let keys = RecursiveKeysView::new(root);
/// assert_eq!(keys.to_vec()?, ["/a/b/dset3", "/a/dset2", "/dset1"]);
/// assert_eq!(
///     keys.iter_rev()?.collect::<Result<Vec<_>, _>>()?,
///     ["/dset1", "/a/dset2", "/a/b/dset3"]
/// );
/// # Ok::<(), nanoutils::Error>(())
/// ```
pub struct RecursiveView<H, P> {
    root: H,
    _kind: PhantomData<P>,
}

/// Recursive view of leaf names.
pub type RecursiveKeysView<H> = RecursiveView<H, Keys>;
/// Recursive view of leaves.
pub type RecursiveValuesView<H> = RecursiveView<H, Values>;
/// Recursive view of `(name, leaf)` pairs.
pub type RecursiveItemsView<H> = RecursiveView<H, Items>;

impl<H: Hierarchy, P: Projection<H>> RecursiveView<H, P> {
    /// Creates a view rooted at `root`.
    pub fn new(root: H) -> Self {
        RecursiveView {
            root,
            _kind: PhantomData,
        }
    }

    /// The root group.
    pub fn root(&self) -> &H {
        &self.root
    }

    /// Walks the tree depth-first in forward order.
    pub fn iter(&self) -> DepthFirst<H, P> {
        DepthFirst::new(&self.root, false)
    }

    /// Walks the tree depth-first in reverse order.
    ///
    /// # Errors
    /// Returns [`crate::Error::Type`] up front when the resource does not support reverse order.
    pub fn iter_rev(&self) -> Result<DepthFirst<H, P>> {
        // Fails before the first step rather than on it
        self.root.children_rev().map(|children| DepthFirst {
            stack: vec![children.into_iter()],
            pending: None,
            reverse: true,
            _kind: PhantomData,
        })
    }

    /// Collects all items in forward order.
    ///
    /// # Errors
    /// Propagates traversal errors.
    pub fn to_vec(&self) -> Result<Vec<P::Item>> {
        self.iter().collect()
    }

    /// Number of leaves.
    ///
    /// # Errors
    /// Propagates traversal errors.
    pub fn len(&self) -> Result<usize> {
        self.iter().try_fold(0, |count, item| item.map(|_| count + 1))
    }

    /// Whether the tree has no leaves.
    ///
    /// # Errors
    /// Propagates traversal errors.
    pub fn is_empty(&self) -> Result<bool> {
        self.iter().next().transpose().map(|first| first.is_none())
    }

    /// Whether any item equals `item`.
    ///
    /// # Errors
    /// Propagates traversal errors.
    pub fn contains(&self, item: &P::Item) -> Result<bool>
    where
        P::Item: PartialEq,
    {
        for candidate in self.iter() {
            if candidate? == *item {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl<H, P> RecursiveView<H, P>
where
    H: Hierarchy,
    P: Projection<H>,
    P::Item: Hash + Eq,
{
    /// Materializes the view into a set.
    ///
    /// # Errors
    /// Propagates traversal errors.
    pub fn to_set(&self) -> Result<HashSet<P::Item>> {
        self.iter().collect()
    }

    /// Items in the view or in `other`.
    ///
    /// # Errors
    /// Propagates traversal errors.
    pub fn union<I: IntoIterator<Item = P::Item>>(&self, other: I) -> Result<HashSet<P::Item>> {
        let mut set = self.to_set()?;
        set.extend(other);
        Ok(set)
    }

    /// Items in both the view and `other`.
    ///
    /// # Errors
    /// Propagates traversal errors.
    pub fn intersection<I: IntoIterator<Item = P::Item>>(
        &self,
        other: I,
    ) -> Result<HashSet<P::Item>> {
        let set = self.to_set()?;
        Ok(other.into_iter().filter(|item| set.contains(item)).collect())
    }

    /// Items in the view but not in `other`.
    ///
    /// # Errors
    /// Propagates traversal errors.
    pub fn difference<I: IntoIterator<Item = P::Item>>(
        &self,
        other: I,
    ) -> Result<HashSet<P::Item>> {
        let mut set = self.to_set()?;
        for item in other {
            set.remove(&item);
        }
        Ok(set)
    }

    /// Items in exactly one of the view and `other`.
    ///
    /// # Errors
    /// Propagates traversal errors.
    pub fn symmetric_difference<I: IntoIterator<Item = P::Item>>(
        &self,
        other: I,
    ) -> Result<HashSet<P::Item>> {
        let mut set = self.to_set()?;
        let other: HashSet<P::Item> = other.into_iter().collect();
        for item in other {
            if !set.remove(&item) {
                set.insert(item);
            }
        }
        Ok(set)
    }

    /// Whether every item of the view is in `other`.
    ///
    /// # Errors
    /// Propagates traversal errors.
    pub fn is_subset(&self, other: &HashSet<P::Item>) -> Result<bool> {
        Ok(self.to_set()?.is_subset(other))
    }

    /// Whether every item of `other` is in the view.
    ///
    /// # Errors
    /// Propagates traversal errors.
    pub fn is_superset(&self, other: &HashSet<P::Item>) -> Result<bool> {
        Ok(self.to_set()?.is_superset(other))
    }

    /// Whether the view and `other` share no items.
    ///
    /// # Errors
    /// Propagates traversal errors.
    pub fn is_disjoint(&self, other: &HashSet<P::Item>) -> Result<bool> {
        Ok(self.to_set()?.is_disjoint(other))
    }

    fn counts(&self) -> Result<HashMap<P::Item, usize>> {
        let mut counts = HashMap::new();
        for item in self.iter() {
            *counts.entry(item?).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Compares the materialized contents of two views.
    ///
    /// Leaf names are unique within a tree, so comparing multisets is the same as comparing
    /// sets for keys and items.
    ///
    /// # Errors
    /// Propagates traversal errors of either view.
    pub fn try_eq(&self, other: &Self) -> Result<bool> {
        let mut counts = self.counts()?;
        for item in other.iter() {
            match counts.get_mut(&item?) {
                Some(count) if *count > 0 => *count -= 1,
                _ => return Ok(false),
            }
        }
        Ok(counts.values().all(|count| *count == 0))
    }
}

impl<H, P> PartialEq for RecursiveView<H, P>
where
    H: Hierarchy,
    P: Projection<H>,
    P::Item: Hash + Eq,
{
    fn eq(&self, other: &Self) -> bool {
        self.try_eq(other).unwrap_or(false)
    }
}

impl<H, P> fmt::Debug for RecursiveView<H, P>
where
    H: Hierarchy,
    P: Projection<H>,
    P::Item: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = " ".repeat(3 + P::NAME.len());
        write!(f, "<{} [", P::NAME)?;
        for (i, item) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",\n{indent}")?;
            }
            match item {
                Ok(item) => write!(f, "{item:?}")?,
                Err(error) => write!(f, "<{error}>")?,
            }
        }
        f.write_str("]>")
    }
}

impl<H, P> Serialize for RecursiveView<H, P> {
    fn serialize<S: Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
        refuse_serialize!(S, "cannot serialize a live view of external data")
    }
}

/// Depth-first iterator over the leaves of a [`Hierarchy`].
///
/// Yields `Err` once for every group whose children cannot be listed, then continues with
/// the next sibling.
pub struct DepthFirst<H: Hierarchy, P> {
    stack: Vec<std::vec::IntoIter<Node<H, H::Leaf>>>,
    pending: Option<crate::Error>,
    reverse: bool,
    _kind: PhantomData<P>,
}

impl<H: Hierarchy, P> DepthFirst<H, P> {
    fn new(root: &H, reverse: bool) -> Self {
        let listed = if reverse {
            root.children_rev()
        } else {
            root.children()
        };
        let (stack, pending) = match listed {
            Ok(children) => (vec![children.into_iter()], None),
            Err(error) => (Vec::new(), Some(error)),
        };
        DepthFirst {
            stack,
            pending,
            reverse,
            _kind: PhantomData,
        }
    }
}

impl<H: Hierarchy, P: Projection<H>> Iterator for DepthFirst<H, P> {
    type Item = Result<P::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(error) = self.pending.take() {
            return Some(Err(error));
        }
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                None => {
                    self.stack.pop();
                }
                Some(Node::Leaf(leaf)) => return Some(Ok(P::project(leaf))),
                Some(Node::Group(group)) => {
                    let listed = if self.reverse {
                        group.children_rev()
                    } else {
                        group.children()
                    };
                    match listed {
                        Ok(children) => self.stack.push(children.into_iter()),
                        Err(error) => return Some(Err(error)),
                    }
                }
            }
        }
    }
}
