//! Read-only, live views over sequences owned elsewhere.

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, RwLock},
};

use serde::{Serialize, Serializer};

use crate::{Error, Result};

/// Storage a [`SequenceView`] can read from.
///
/// Implementors answer length and element queries at call time, so a view over shared storage
/// reflects mutations made by the owner. `identity` is the address of the owning storage and
/// is the basis for hashing views.
pub trait SequenceSource {
    /// The element type handed out by the view.
    type Item;

    /// Current number of elements.
    fn len(&self) -> usize;

    /// The element at `index`, or `None` past the end.
    fn get(&self, index: usize) -> Option<Self::Item>;

    /// Address of the storage that owns the elements.
    fn identity(&self) -> usize;

    /// Whether the source has no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> SequenceSource for Arc<RwLock<Vec<T>>> {
    type Item = T;

    fn len(&self) -> usize {
        read_lock!(self).len()
    }

    fn get(&self, index: usize) -> Option<T> {
        read_lock!(self).as_slice().get(index).cloned()
    }

    fn identity(&self) -> usize {
        Arc::as_ptr(self) as usize
    }
}

impl<T: Clone> SequenceSource for Arc<[T]> {
    type Item = T;

    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn get(&self, index: usize) -> Option<T> {
        <[T]>::get(self, index).cloned()
    }

    fn identity(&self) -> usize {
        Arc::as_ptr(self).cast::<()>() as usize
    }
}

impl<T: Clone> SequenceSource for Arc<Vec<T>> {
    type Item = T;

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn get(&self, index: usize) -> Option<T> {
        self.as_slice().get(index).cloned()
    }

    fn identity(&self) -> usize {
        Arc::as_ptr(self) as usize
    }
}

impl<T: Clone> SequenceSource for &[T] {
    type Item = T;

    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn get(&self, index: usize) -> Option<T> {
        <[T]>::get(self, index).cloned()
    }

    fn identity(&self) -> usize {
        self.as_ptr() as usize
    }
}

impl<T: Clone> SequenceSource for Vec<T> {
    type Item = T;

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn get(&self, index: usize) -> Option<T> {
        self.as_slice().get(index).cloned()
    }

    fn identity(&self) -> usize {
        self.as_ptr() as usize
    }
}

impl<S: SequenceSource> SequenceSource for SequenceView<S> {
    type Item = S::Item;

    fn len(&self) -> usize {
        self.source.len()
    }

    fn get(&self, index: usize) -> Option<S::Item> {
        self.source.get(index)
    }

    fn identity(&self) -> usize {
        self.source.identity()
    }
}

/// Normalizes optional slice bounds the way sequence slicing does.
///
/// Returns `(start, stop, step)` with `start`/`stop` clamped into the valid range for the step
/// direction; a negative `stop` of `-1` means "before index 0" for negative steps.
fn slice_indices(
    len: usize,
    start: Option<isize>,
    stop: Option<isize>,
    step: Option<isize>,
) -> Result<(isize, isize, isize)> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(Error::Value("slice step cannot be zero".to_string()));
    }

    let len = isize::try_from(len).unwrap_or(isize::MAX);
    let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };
    let clamp = |index: isize| {
        if index < 0 {
            (index + len).max(lower)
        } else {
            index.min(upper)
        }
    };

    let start = start.map_or(if step < 0 { upper } else { lower }, clamp);
    let stop = stop.map_or(if step < 0 { lower } else { upper }, clamp);
    Ok((start, stop, step))
}

/// Clamps an optional search bound into `0..=len`.
fn search_bound(len: usize, bound: Option<isize>, default: usize) -> usize {
    match bound {
        None => default,
        Some(index) if index < 0 => len.saturating_sub(index.unsigned_abs()),
        Some(index) => index.unsigned_abs().min(len),
    }
}

/// A read-only view of a sequence owned elsewhere.
///
/// Every query reads the source at call time, so a view over an `Arc<RwLock<Vec<T>>>` sees
/// pushes and removals made by whoever holds the lock. The view itself offers no mutation.
///
/// - Equality is element-wise against other views, slices, arrays and vectors.
/// - Hashing uses the identity of the underlying storage, not the contents; a view of a view
///   hashes like the innermost view.
/// - `clone` shares the source.
/// - Serialization always fails.
///
/// # Examples
///
/// ```rust
/// use nanoutils::view::SequenceView;
/// use std::sync::{Arc, RwLock};
///
/// let data = Arc::new(RwLock::new(vec![1, 2, 3]));
/// let view = SequenceView::new(data.clone());
/// assert_eq!(view.len(), 3);
///
/// data.write().unwrap().push(4);
/// assert_eq!(view.len(), 4);
/// assert_eq!(view.at(-1)?, 4);
/// assert_eq!(view.slice(Some(1), None, Some(2))?, [2, 4]);
/// # Ok::<(), nanoutils::Error>(())
/// ```
#[derive(Clone)]
pub struct SequenceView<S> {
    source: S,
}

impl<S: SequenceSource> SequenceView<S> {
    /// Creates a view over `source`.
    pub fn new(source: S) -> Self {
        SequenceView { source }
    }

    /// Current number of elements.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Whether the sequence is currently empty.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// The element at `index`.
    pub fn get(&self, index: usize) -> Option<S::Item> {
        self.source.get(index)
    }

    /// The element at a signed index; negative indices count from the end.
    pub fn get_signed(&self, index: isize) -> Option<S::Item> {
        let resolved = if index < 0 {
            self.len().checked_sub(index.unsigned_abs())?
        } else {
            index.unsigned_abs()
        };
        self.source.get(resolved)
    }

    /// Like [`SequenceView::get_signed`], failing outside the sequence.
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] when `index` is outside the sequence.
    pub fn at(&self, index: isize) -> Result<S::Item> {
        self.get_signed(index).ok_or_else(|| Error::IndexOutOfRange {
            index,
            len: self.len(),
        })
    }

    /// Copies the selected elements into a new view.
    ///
    /// Bounds follow sequence slicing: `None` means "from the start/end", negative values count
    /// from the end, out-of-range values are clamped and a negative `step` walks backwards.
    ///
    /// # Errors
    /// Returns [`Error::Value`] when `step` is zero.
    pub fn slice(
        &self,
        start: Option<isize>,
        stop: Option<isize>,
        step: Option<isize>,
    ) -> Result<SequenceView<Vec<S::Item>>>
    where
        S::Item: Clone,
    {
        let (mut index, stop, step) = slice_indices(self.len(), start, stop, step)?;
        let mut items = Vec::new();
        while (step > 0 && index < stop) || (step < 0 && index > stop) {
            // The source may shrink between reads
            let Some(item) = usize::try_from(index).ok().and_then(|i| self.source.get(i)) else {
                break;
            };
            items.push(item);
            match index.checked_add(step) {
                Some(next) => index = next,
                None => break,
            }
        }
        Ok(SequenceView::new(items))
    }

    /// Position of the first element equal to `value` within `start..stop`.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] when no element in range matches.
    pub fn index_of(
        &self,
        value: &S::Item,
        start: Option<isize>,
        stop: Option<isize>,
    ) -> Result<usize>
    where
        S::Item: PartialEq + fmt::Debug,
    {
        let len = self.len();
        let start = search_bound(len, start, 0);
        let stop = search_bound(len, stop, len);
        (start..stop)
            .find(|&i| self.source.get(i).as_ref() == Some(value))
            .ok_or_else(|| Error::NotFound(format!("{value:?}")))
    }

    /// Number of elements equal to `value`.
    pub fn count(&self, value: &S::Item) -> usize
    where
        S::Item: PartialEq,
    {
        self.iter().filter(|item| item == value).count()
    }

    /// Whether any element equals `value`.
    pub fn contains(&self, value: &S::Item) -> bool
    where
        S::Item: PartialEq,
    {
        self.iter().any(|item| item == *value)
    }

    /// Iterates over the current elements. See [`Iter`].
    pub fn iter(&self) -> Iter<'_, S> {
        Iter {
            view: self,
            front: 0,
            back: None,
        }
    }

    /// Copies the current elements into a vector.
    pub fn to_vec(&self) -> Vec<S::Item> {
        self.iter().collect()
    }
}

/// Iterator over a [`SequenceView`].
///
/// Forward iteration re-reads the length on every step, so it sees elements appended during
/// iteration and stops early when the source shrinks. Reverse iteration starts from the
/// length observed on its first step.
pub struct Iter<'a, S> {
    view: &'a SequenceView<S>,
    front: usize,
    back: Option<usize>,
}

impl<S: SequenceSource> Iterator for Iter<'_, S> {
    type Item = S::Item;

    fn next(&mut self) -> Option<S::Item> {
        let end = self.back.unwrap_or_else(|| self.view.len());
        if self.front >= end {
            return None;
        }
        let item = self.view.source.get(self.front)?;
        self.front += 1;
        Some(item)
    }
}

impl<S: SequenceSource> DoubleEndedIterator for Iter<'_, S> {
    fn next_back(&mut self) -> Option<S::Item> {
        let back = *self.back.get_or_insert_with(|| self.view.len());
        if back <= self.front {
            return None;
        }
        let index = back - 1;
        match self.view.source.get(index) {
            Some(item) => {
                self.back = Some(index);
                Some(item)
            }
            None => {
                self.back = Some(self.front);
                None
            }
        }
    }
}

impl<'a, S: SequenceSource> IntoIterator for &'a SequenceView<S> {
    type Item = S::Item;
    type IntoIter = Iter<'a, S>;

    fn into_iter(self) -> Iter<'a, S> {
        self.iter()
    }
}

impl<S: SequenceSource> Hash for SequenceView<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.source.identity());
    }
}

impl<S, O> PartialEq<SequenceView<O>> for SequenceView<S>
where
    S: SequenceSource,
    O: SequenceSource,
    S::Item: PartialEq<O::Item>,
{
    fn eq(&self, other: &SequenceView<O>) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<S, T> PartialEq<[T]> for SequenceView<S>
where
    S: SequenceSource,
    S::Item: PartialEq<T>,
{
    fn eq(&self, other: &[T]) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a == *b)
    }
}

impl<S, T> PartialEq<Vec<T>> for SequenceView<S>
where
    S: SequenceSource,
    S::Item: PartialEq<T>,
{
    fn eq(&self, other: &Vec<T>) -> bool {
        *self == *other.as_slice()
    }
}

impl<S, T, const N: usize> PartialEq<[T; N]> for SequenceView<S>
where
    S: SequenceSource,
    S::Item: PartialEq<T>,
{
    fn eq(&self, other: &[T; N]) -> bool {
        *self == other[..]
    }
}

impl<S> fmt::Debug for SequenceView<S>
where
    S: SequenceSource,
    S::Item: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SequenceView(")?;
        f.debug_list().entries(self.iter()).finish()?;
        f.write_str(")")
    }
}

impl<S> Serialize for SequenceView<S> {
    fn serialize<Ser: Serializer>(&self, _: Ser) -> std::result::Result<Ser::Ok, Ser::Error> {
        refuse_serialize!(Ser, "cannot serialize a live view of external data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn indexing() {
        let view = SequenceView::new(vec![10, 20, 30]);
        assert_eq!(view.get(0), Some(10));
        assert_eq!(view.get_signed(-1), Some(30));
        assert_eq!(view.get_signed(-4), None);
        assert_eq!(view.at(1).unwrap(), 20);
        assert!(matches!(
            view.at(3),
            Err(Error::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn slicing() {
        let data: Arc<[i32]> = Arc::from(vec![0, 1, 2, 3, 4, 5]);
        let view = SequenceView::new(data);

        assert_eq!(view.slice(None, None, None).unwrap(), [0, 1, 2, 3, 4, 5]);
        assert_eq!(view.slice(Some(1), Some(4), None).unwrap(), [1, 2, 3]);
        assert_eq!(view.slice(Some(-2), None, None).unwrap(), [4, 5]);
        assert_eq!(view.slice(None, None, Some(-1)).unwrap(), [5, 4, 3, 2, 1, 0]);
        assert_eq!(view.slice(Some(4), Some(1), Some(-2)).unwrap(), [4, 2]);
        assert_eq!(view.slice(Some(100), None, None).unwrap(), [] as [i32; 0]);
        assert_eq!(view.slice(Some(-100), Some(2), None).unwrap(), [0, 1]);
        assert!(matches!(view.slice(None, None, Some(0)), Err(Error::Value(_))));
    }

    #[test]
    fn slicing_with_extreme_steps() {
        let view = SequenceView::new(vec![1, 2, 3]);
        assert_eq!(view.slice(Some(1), None, Some(isize::MAX)).unwrap(), [2]);
        assert_eq!(view.slice(None, None, Some(isize::MAX)).unwrap(), [1]);
        assert_eq!(view.slice(None, None, Some(isize::MIN)).unwrap(), [3]);
        assert_eq!(view.slice(Some(1), None, Some(isize::MIN)).unwrap(), [2]);

        let shared = SequenceView::new(Arc::new(RwLock::new(vec!['x', 'y'])));
        assert_eq!(shared.slice(Some(-1), None, Some(isize::MIN)).unwrap(), ['y']);
    }

    #[test]
    fn searching() {
        let view = SequenceView::new(&[1, 2, 1, 3][..]);
        assert_eq!(view.index_of(&1, None, None).unwrap(), 0);
        assert_eq!(view.index_of(&1, Some(1), None).unwrap(), 2);
        assert_eq!(view.index_of(&1, Some(-2), None).unwrap(), 2);
        assert!(matches!(view.index_of(&3, None, Some(3)), Err(Error::NotFound(_))));
        assert_eq!(view.count(&1), 2);
        assert!(view.contains(&3));
        assert!(!view.contains(&9));
    }

    #[test]
    fn live_mutation() {
        let data = Arc::new(RwLock::new(vec!['a', 'b']));
        let view = SequenceView::new(data.clone());
        data.write().unwrap().push('c');
        assert_eq!(view, ['a', 'b', 'c']);
        assert_eq!(view.get(2), Some('c'));
        assert_eq!(data.get(5), None);
        data.write().unwrap().clear();
        assert!(view.is_empty());
        assert_eq!(view.iter().count(), 0);
    }

    #[test]
    fn iteration_stops_when_source_shrinks() {
        let data = Arc::new(RwLock::new(vec![1, 2, 3, 4]));
        let view = SequenceView::new(data.clone());
        let mut iter = view.iter();
        assert_eq!(iter.next(), Some(1));
        data.write().unwrap().truncate(1);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn reverse_iteration() {
        let view = SequenceView::new(vec![1, 2, 3, 4]);
        assert_eq!(view.iter().rev().collect::<Vec<_>>(), [4, 3, 2, 1]);

        let mut iter = view.iter();
        assert_eq!(iter.next(), Some(1));
        assert_eq!(iter.next_back(), Some(4));
        assert_eq!(iter.next(), Some(2));
        assert_eq!(iter.next_back(), Some(3));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn hashing_follows_storage_identity() {
        let data = Arc::new(RwLock::new(vec![1, 2, 3]));
        let a = SequenceView::new(data.clone());
        let b = a.clone();
        let nested = SequenceView::new(a.clone());
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(hash_of(&a), hash_of(&nested));

        let other = SequenceView::new(Arc::new(RwLock::new(vec![1, 2, 3])));
        assert_eq!(a, other);
        assert_ne!(hash_of(&a), hash_of(&other));
    }

    #[test]
    fn equality_and_debug() {
        let view = SequenceView::new(vec![1, 2, 3]);
        assert_eq!(view, vec![1, 2, 3]);
        assert_eq!(view, [1, 2, 3]);
        assert_ne!(view, [1, 2]);
        assert_eq!(format!("{view:?}"), "SequenceView([1, 2, 3])");
    }

    #[test]
    fn serialization_fails() {
        let view = SequenceView::new(vec![1]);
        let error = serde_json::to_string(&view).unwrap_err();
        assert!(error.to_string().contains("cannot serialize a live view"));
    }
}
