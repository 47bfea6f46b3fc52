//! Collecting matching errors instead of propagating them.

use std::{
    collections::HashSet,
    fmt,
    sync::{Arc, RwLock},
};

use crate::{view::SequenceView, Error, ErrorKind};

type Matcher<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// Live view of the errors collected by a [`CatchErrors`].
pub type CaughtErrors<E> = SequenceView<Arc<RwLock<Vec<Arc<E>>>>>;

/// Runs fallible closures and keeps the errors that match, letting others through.
///
/// # Examples
///
/// ```rust
/// use nanoutils::{context::CatchErrors, Error, ErrorKind};
///
/// let catcher = CatchErrors::kinds([ErrorKind::Key]);
/// let caught = catcher.caught();
///
/// let value = catcher.catch(|| Err::<u8, _>(Error::Key("a".into())))?;
/// assert_eq!(value, None);
/// assert_eq!(caught.len(), 1);
///
/// assert!(catcher.catch(|| Err::<u8, _>(Error::Value("bad".into()))).is_err());
/// assert_eq!(catcher.catch(|| Ok::<u8, Error>(1))?, Some(1));
/// # Ok::<(), nanoutils::Error>(())
/// ```
pub struct CatchErrors<E> {
    matcher: Matcher<E>,
    caught: Arc<RwLock<Vec<Arc<E>>>>,
}

impl<E> CatchErrors<E> {
    /// Catches every error for which `matcher` returns `true`.
    pub fn new(matcher: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        CatchErrors {
            matcher: Box::new(matcher),
            caught: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Runs `f`, storing a matching error and returning `Ok(None)` in its place.
    ///
    /// # Errors
    /// Returns errors that do not match unchanged.
    pub fn catch<T>(&self, f: impl FnOnce() -> Result<T, E>) -> Result<Option<T>, E> {
        match f() {
            Ok(value) => Ok(Some(value)),
            Err(error) if (self.matcher)(&error) => {
                write_lock!(self.caught).push(Arc::new(error));
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// A live, read-only view of the caught errors.
    pub fn caught(&self) -> CaughtErrors<E> {
        SequenceView::new(self.caught.clone())
    }

    /// Number of caught errors.
    pub fn len(&self) -> usize {
        read_lock!(self.caught).len()
    }

    /// Whether nothing was caught.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets all caught errors.
    ///
    /// The list is emptied in place rather than replaced, so views returned earlier by
    /// [`CatchErrors::caught`] lose their history too. Take `caught().to_vec()` first to keep it.
    pub fn clear(&self) {
        write_lock!(self.caught).clear();
    }
}

impl CatchErrors<Error> {
    /// Catches crate errors whose [`ErrorKind`] is in `kinds`.
    pub fn kinds(kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        let kinds: HashSet<ErrorKind> = kinds.into_iter().collect();
        Self::new(move |error: &Error| kinds.contains(&error.kind()))
    }
}

impl<E> fmt::Debug for CatchErrors<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatchErrors")
            .field("caught", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_matching_errors() {
        let catcher = CatchErrors::kinds([ErrorKind::Attribute, ErrorKind::Type]);
        let caught = catcher.caught();

        assert_eq!(
            catcher
                .catch(|| Err::<(), _>(Error::attribute("pkg", "bob")))
                .unwrap(),
            None
        );
        assert_eq!(
            catcher.catch(|| Err::<(), _>(Error::Type("x".into()))).unwrap(),
            None
        );
        assert!(matches!(
            catcher.catch(|| Err::<(), _>(Error::Key("k".into()))),
            Err(Error::Key(_))
        ));

        assert_eq!(catcher.len(), 2);
        assert_eq!(caught.len(), 2);
        assert_eq!(caught.at(0).unwrap().kind(), ErrorKind::Attribute);
    }

    #[test]
    fn clear_is_visible_through_views() {
        let catcher = CatchErrors::new(|error: &std::io::Error| {
            error.kind() == std::io::ErrorKind::NotFound
        });
        let caught = catcher.caught();
        catcher
            .catch(|| Err::<(), _>(std::io::Error::from(std::io::ErrorKind::NotFound)))
            .unwrap();
        assert!(!caught.is_empty());

        let history = caught.to_vec();

        catcher.clear();
        assert!(caught.is_empty());
        assert!(catcher.is_empty());
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind(), std::io::ErrorKind::NotFound);
    }
}
