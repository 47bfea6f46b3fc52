//! Temporary attribute patching.

use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, OnceLock},
};

use parking_lot::ReentrantMutex;
use serde::{Serialize, Serializer};
use tracing::trace;

use crate::{
    importer::{Attr, Namespace},
    Result,
};

/// An object whose named attributes can be read and replaced.
pub trait AttrTarget: Send + Sync {
    /// Reads the attribute `name`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Attribute`] when it does not exist.
    fn get_attr(&self, name: &str) -> Result<Attr>;

    /// Replaces the attribute `name`.
    fn set_attr(&self, name: &str, value: Attr);
}

impl AttrTarget for Namespace {
    fn get_attr(&self, name: &str) -> Result<Attr> {
        self.getattr(name)
    }

    fn set_attr(&self, name: &str, value: Attr) {
        self.set(name, value);
    }
}

/// Temporarily replaces one attribute of an object.
///
/// The previous value is captured when the `SetAttr` is built. [`SetAttr::enter`] installs
/// the new value and returns a guard that puts the captured value back when dropped. A
/// `SetAttr` can be entered any number of times, also while already entered on the same
/// thread; each install and restore holds the instance's re-entrant lock.
///
/// # Examples
///
/// ```rust
/// use nanoutils::{context::SetAttr, importer::Namespace};
/// use std::sync::Arc;
///
/// let config = Arc::new(Namespace::new("config").with_attr("verbose", false));
/// let patch = SetAttr::new(config.clone(), "verbose", Arc::new(true))?;
///
/// {
///     let _guard = patch.enter();
///     assert!(*config.get_as::<bool>("verbose")?);
/// }
/// assert!(!*config.get_as::<bool>("verbose")?);
/// # Ok::<(), nanoutils::Error>(())
/// ```
pub struct SetAttr<O> {
    obj: Arc<O>,
    name: String,
    value: Attr,
    previous: Attr,
    lock: ReentrantMutex<()>,
    hash: OnceLock<u64>,
}

impl<O: AttrTarget> SetAttr<O> {
    /// Captures the current value of `name` on `obj` and prepares to replace it with `value`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Attribute`] when `obj` has no attribute `name`.
    pub fn new(obj: Arc<O>, name: impl Into<String>, value: Attr) -> Result<Self> {
        let name = name.into();
        let previous = obj.get_attr(&name)?;
        Ok(SetAttr {
            obj,
            name,
            value,
            previous,
            lock: ReentrantMutex::new(()),
            hash: OnceLock::new(),
        })
    }

    /// The patched object.
    pub fn obj(&self) -> &Arc<O> {
        &self.obj
    }

    /// The patched attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value installed while entered.
    pub fn value(&self) -> &Attr {
        &self.value
    }

    /// The value captured at construction and restored on exit.
    pub fn previous(&self) -> &Attr {
        &self.previous
    }

    /// The current value of the attribute on the object.
    ///
    /// # Errors
    /// Returns [`crate::Error::Attribute`] when the attribute was removed.
    pub fn attr(&self) -> Result<Attr> {
        self.obj.get_attr(&self.name)
    }

    /// Writes `value` to the attribute under the instance lock.
    pub fn set_attr(&self, value: Attr) {
        let _lock = self.lock.lock();
        self.obj.set_attr(&self.name, value);
    }

    /// Installs the new value until the returned guard is dropped.
    #[must_use = "the previous value is restored as soon as the guard is dropped"]
    pub fn enter(&self) -> SetAttrGuard<'_, O> {
        trace!(attr = %self.name, "patching attribute");
        self.set_attr(self.value.clone());
        SetAttrGuard { patch: self }
    }

    /// The cached hash code.
    pub fn hash_code(&self) -> u64 {
        *self.hash.get_or_init(|| {
            let mut hasher = DefaultHasher::new();
            (Arc::as_ptr(&self.obj) as usize).hash(&mut hasher);
            self.name.hash(&mut hasher);
            (Arc::as_ptr(&self.value).cast::<()>() as usize).hash(&mut hasher);
            hasher.finish()
        })
    }
}

/// Restores the captured value of a [`SetAttr`] on drop.
pub struct SetAttrGuard<'a, O: AttrTarget> {
    patch: &'a SetAttr<O>,
}

impl<O: AttrTarget> Drop for SetAttrGuard<'_, O> {
    fn drop(&mut self) {
        trace!(attr = %self.patch.name, "restoring attribute");
        self.patch.set_attr(self.patch.previous.clone());
    }
}

impl<O> PartialEq for SetAttr<O> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.obj, &other.obj)
            && self.name == other.name
            && Arc::ptr_eq(&self.value, &other.value)
    }
}

impl<O> Eq for SetAttr<O> {}

impl<O: AttrTarget> Hash for SetAttr<O> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl<O: fmt::Debug> fmt::Debug for SetAttr<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SetAttr(obj={:?}, name='{}')", self.obj, self.name)
    }
}

impl<O> Serialize for SetAttr<O> {
    fn serialize<S: Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
        refuse_serialize!(S, "cannot serialize 'SetAttr' objects")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{importer::downcast, Error};

    fn flag(ns: &Namespace) -> u8 {
        *ns.get_as::<u8>("flag").unwrap()
    }

    #[test]
    fn restores_on_drop() {
        let ns = Arc::new(Namespace::new("pkg").with_attr("flag", 1_u8));
        let patch = SetAttr::new(ns.clone(), "flag", Arc::new(2_u8)).unwrap();
        {
            let _guard = patch.enter();
            assert_eq!(flag(&ns), 2);
        }
        assert_eq!(flag(&ns), 1);
    }

    #[test]
    fn reusable_and_reentrant() {
        let ns = Arc::new(Namespace::new("pkg").with_attr("flag", 1_u8));
        let patch = SetAttr::new(ns.clone(), "flag", Arc::new(2_u8)).unwrap();
        {
            let _outer = patch.enter();
            {
                let _inner = patch.enter();
                assert_eq!(flag(&ns), 2);
            }
            // Every exit restores the value captured at construction
            assert_eq!(flag(&ns), 1);
        }
        drop(patch.enter());
        assert_eq!(flag(&ns), 1);
    }

    #[test]
    fn missing_attribute() {
        let ns = Arc::new(Namespace::new("pkg"));
        let result = SetAttr::new(ns, "flag", Arc::new(2_u8));
        assert!(matches!(result, Err(Error::Attribute { .. })));
    }

    #[test]
    fn accessors() {
        let ns = Arc::new(Namespace::new("pkg").with_attr("flag", 1_u8));
        let patch = SetAttr::new(ns.clone(), "flag", Arc::new(2_u8)).unwrap();
        assert_eq!(patch.name(), "flag");
        assert!(Arc::ptr_eq(patch.obj(), &ns));
        assert_eq!(*downcast::<u8>(patch.previous().clone(), "flag").unwrap(), 1);

        patch.set_attr(Arc::new(5_u8));
        assert_eq!(*downcast::<u8>(patch.attr().unwrap(), "flag").unwrap(), 5);
    }

    #[test]
    fn identity_equality_and_hash() {
        let ns = Arc::new(Namespace::new("pkg").with_attr("flag", 1_u8));
        let value: Attr = Arc::new(2_u8);
        let a = SetAttr::new(ns.clone(), "flag", value.clone()).unwrap();
        let b = SetAttr::new(ns.clone(), "flag", value).unwrap();
        let c = SetAttr::new(ns, "flag", Arc::new(2_u8)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hash_code(), b.hash_code());
        assert_ne!(a, c);

        assert_eq!(format!("{a:?}"), "SetAttr(obj=<module 'pkg'>, name='flag')");
        assert!(serde_json::to_string(&a).is_err());
    }
}
