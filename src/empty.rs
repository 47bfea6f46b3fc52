//! Immutable empty containers, usable as default arguments.
//!
//! Every type here is zero-sized and `Copy`, for any element type. The `const fn`
//! constructors can be used in `const` and `static` items.
//!
//! ```rust
//! use nanoutils::empty::{empty_mapping, EmptyMapping};
//!
//! const NO_OPTIONS: EmptyMapping<&str, u32> = empty_mapping();
//!
//! fn lookup(options: &EmptyMapping<&str, u32>) -> Option<u32> {
//!     options.get(&"depth").copied()
//! }
//! assert_eq!(lookup(&NO_OPTIONS), None);
//! assert!(NO_OPTIONS.is_empty());
//! ```

use std::{
    fmt,
    hash::{Hash, Hasher},
    iter,
    marker::PhantomData,
    ops::Deref,
};

use crate::view::SequenceSource;

macro_rules! empty_type {
    ($(#[$meta:meta])* $name:ident<$($param:ident),+>, $ctor:ident, $repr:literal) => {
        $(#[$meta])*
        pub struct $name<$($param),+>(PhantomData<fn() -> ($($param,)+)>);

        #[doc = concat!("Returns the empty [`", stringify!($name), "`].")]
        pub const fn $ctor<$($param),+>() -> $name<$($param),+> {
            $name(PhantomData)
        }

        impl<$($param),+> $name<$($param),+> {
            /// Always zero.
            pub const fn len(&self) -> usize {
                0
            }

            /// Always `true`.
            pub const fn is_empty(&self) -> bool {
                true
            }
        }

        impl<$($param),+> Clone for $name<$($param),+> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<$($param),+> Copy for $name<$($param),+> {}

        impl<$($param),+> Default for $name<$($param),+> {
            fn default() -> Self {
                $ctor()
            }
        }

        impl<$($param),+> PartialEq for $name<$($param),+> {
            fn eq(&self, _: &Self) -> bool {
                true
            }
        }

        impl<$($param),+> Eq for $name<$($param),+> {}

        impl<$($param),+> Hash for $name<$($param),+> {
            fn hash<H: Hasher>(&self, state: &mut H) {
                state.write_usize(0);
            }
        }

        impl<$($param),+> fmt::Debug for $name<$($param),+> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str($repr)
            }
        }
    };
}

empty_type!(
    /// An empty sequence. Derefs to an empty slice.
    EmptySequence<T>,
    empty_sequence,
    "[]"
);

empty_type!(
    /// An empty key-value mapping.
    EmptyMapping<K, V>,
    empty_mapping,
    "{}"
);

empty_type!(
    /// An empty set.
    EmptySet<T>,
    empty_set,
    "{}"
);

empty_type!(
    /// An empty sized, iterable collection.
    EmptyCollection<T>,
    empty_collection,
    "{}"
);

empty_type!(
    /// An empty container supporting only membership tests.
    EmptyContainer<T>,
    empty_container,
    "{}"
);

impl<T> Deref for EmptySequence<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &[]
    }
}

impl<T> SequenceSource for EmptySequence<T> {
    type Item = T;

    fn len(&self) -> usize {
        0
    }

    fn get(&self, _: usize) -> Option<T> {
        None
    }

    fn identity(&self) -> usize {
        0
    }
}

impl<K, V> EmptyMapping<K, V> {
    /// Always `None`.
    pub fn get(&self, _: &K) -> Option<&V> {
        None
    }

    /// Always `false`.
    pub fn contains_key(&self, _: &K) -> bool {
        false
    }

    /// Yields nothing.
    pub fn keys(&self) -> iter::Empty<&K> {
        iter::empty()
    }

    /// Yields nothing.
    pub fn values(&self) -> iter::Empty<&V> {
        iter::empty()
    }

    /// Yields nothing.
    pub fn iter(&self) -> iter::Empty<(&K, &V)> {
        iter::empty()
    }
}

impl<T> EmptySet<T> {
    /// Always `false`.
    pub fn contains(&self, _: &T) -> bool {
        false
    }

    /// Yields nothing.
    pub fn iter(&self) -> iter::Empty<&T> {
        iter::empty()
    }

    /// The empty set is a subset of every set.
    pub fn is_subset<I: IntoIterator<Item = T>>(&self, _: I) -> bool {
        true
    }

    /// The empty set shares no element with any set.
    pub fn is_disjoint<I: IntoIterator<Item = T>>(&self, _: I) -> bool {
        true
    }
}

impl<T> EmptyCollection<T> {
    /// Always `false`.
    pub fn contains(&self, _: &T) -> bool {
        false
    }

    /// Yields nothing.
    pub fn iter(&self) -> iter::Empty<&T> {
        iter::empty()
    }
}

impl<T> EmptyContainer<T> {
    /// Always `false`.
    pub fn contains(&self, _: &T) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::SequenceView;

    const SEQUENCE: EmptySequence<String> = empty_sequence();

    #[test]
    fn all_empty() {
        assert!(SEQUENCE.is_empty());
        assert_eq!(SEQUENCE.first(), None);
        assert_eq!(SEQUENCE.iter().count(), 0);

        let mapping = empty_mapping::<&str, i32>();
        assert_eq!(mapping.len(), 0);
        assert_eq!(mapping.get(&"a"), None);
        assert!(!mapping.contains_key(&"a"));
        assert_eq!(mapping.iter().count(), 0);

        let set = empty_set::<u8>();
        assert!(!set.contains(&1));
        assert!(set.is_subset([1, 2]));
        assert!(set.is_disjoint([1, 2]));

        assert!(!empty_collection::<u8>().contains(&0));
        assert!(!empty_container::<u8>().contains(&0));
    }

    #[test]
    fn zero_sized_and_copy() {
        assert_eq!(std::mem::size_of::<EmptyMapping<String, Vec<u8>>>(), 0);
        let a = empty_set::<String>();
        let b = a;
        assert_eq!(a, b);
        assert_eq!(format!("{a:?}"), "{}");
        assert_eq!(format!("{SEQUENCE:?}"), "[]");
    }

    #[test]
    fn backs_a_sequence_view() {
        let view = SequenceView::new(empty_sequence::<u8>());
        assert!(view.is_empty());
        assert_eq!(view.get(0), None);
    }
}
