#![allow(unused_macros)]

/// Helper macro for locking items
///
/// A poisoned lock is recovered rather than propagated: every value guarded in this crate
/// is left consistent between statements, so a panic elsewhere cannot tear it.
///
/// ```rust, ignore
///  let mut data = lock!(my_mutex);
///  data.some_field = 42;
/// ```
macro_rules! lock {
    ($lock:expr) => {
        $lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    };
}

/// Helper macro for reading locked items
///
/// ```rust, ignore
///  let data = read_lock!(my_arc_rwlock);
///  println!("{}", data.len());
/// ```
macro_rules! read_lock {
    ($arc_rwlock:expr) => {
        $arc_rwlock
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    };
}

/// Helper macro for writing to locked items
///
/// ```rust, ignore
///  let mut data = write_lock!(my_arc_rwlock);
///  data.push(42);
/// ```
macro_rules! write_lock {
    ($arc_rwlock:expr) => {
        $arc_rwlock
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    };
}

/// Helper macro for reading locked items
///
/// ```rust, ignore
///  let len = with_read!(table, |table| table.len());
/// ```
macro_rules! with_read {
    ($arc_rwlock:expr, $closure:expr) => {{
        let guard = read_lock!($arc_rwlock);
        $closure(&*guard)
    }};
}

/// Helper macro for writing to locked items
///
/// ```rust, ignore
///  with_write!(table, |table| table.insert("Any".to_string(), "typing".to_string()));
/// ```
macro_rules! with_write {
    ($arc_rwlock:expr, $closure:expr) => {{
        let mut guard = write_lock!($arc_rwlock);
        $closure(&mut *guard)
    }};
}

/// Builds a serializer error for types that refuse serialization.
///
/// ```rust, ignore
/// impl Serialize for MyView {
///     fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
///         refuse_serialize!(S, "cannot serialize a live view of external data")
///     }
/// }
/// ```
macro_rules! refuse_serialize {
    ($serializer:ty, $msg:expr) => {
        Err(<<$serializer as serde::Serializer>::Error as serde::ser::Error>::custom($msg))
    };
}
