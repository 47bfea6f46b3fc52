//! Cleanup helpers for tests.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::warn;

/// Deletes files and directories when dropped.
///
/// Directories are removed recursively. A missing path is logged as a warning when `warn`
/// is set; failed deletions are always logged. Nothing is ever propagated from `drop`.
///
/// ```rust
/// use nanoutils::utils::DeleteFinally;
///
/// let dir = tempfile::tempdir()?;
/// std::fs::write(dir.path().join("file1.txt"), "")?;
/// std::fs::create_dir(dir.path().join("dir1"))?;
///
/// DeleteFinally::new(["file1.txt", "dir1"])
///     .with_prefix(dir.path())
///     .run(|| assert!(dir.path().join("dir1").is_dir()));
///
/// assert!(!dir.path().join("file1.txt").exists());
/// assert!(!dir.path().join("dir1").exists());
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct DeleteFinally {
    paths: Vec<PathBuf>,
    prefix: Option<PathBuf>,
    warn: bool,
}

impl DeleteFinally {
    /// Schedules `paths` for deletion. Relative paths resolve against the prefix, if any, or
    /// the working directory.
    pub fn new<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Self {
        DeleteFinally {
            paths: paths.into_iter().map(Into::into).collect(),
            prefix: None,
            warn: true,
        }
    }

    /// Resolves every path against `prefix`.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl AsRef<Path>) -> Self {
        self.prefix = Some(prefix.as_ref().to_path_buf());
        self
    }

    /// Whether missing paths are logged.
    #[must_use]
    pub fn with_warn(mut self, warn: bool) -> Self {
        self.warn = warn;
        self
    }

    /// The paths that will be deleted, with the prefix applied.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths
            .iter()
            .map(|path| match &self.prefix {
                Some(prefix) => prefix.join(path),
                None => path.clone(),
            })
            .collect()
    }

    /// Runs `f`, then deletes the paths, also when `f` panics.
    pub fn run<T>(self, f: impl FnOnce() -> T) -> T {
        let _guard = self;
        f()
    }
}

fn delete(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).map(|()| true),
        Ok(_) => fs::remove_file(path).map(|()| true),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(error) => Err(error),
    }
}

impl Drop for DeleteFinally {
    fn drop(&mut self) {
        for path in self.paths() {
            match delete(&path) {
                Ok(true) => {}
                Ok(false) if self.warn => {
                    warn!(path = %path.display(), "no such file or directory");
                }
                Ok(false) => {}
                Err(error) => warn!(path = %path.display(), %error, "failed to delete"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletes_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        let nested = dir.path().join("b/c");
        fs::write(&file, "x").unwrap();
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("d.txt"), "x").unwrap();

        {
            let _cleanup = DeleteFinally::new([file.clone(), dir.path().join("b")]);
            assert!(file.exists());
        }
        assert!(!file.exists());
        assert!(!dir.path().join("b").exists());
    }

    #[test]
    fn runs_and_returns() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("out.txt"), "x").unwrap();
        let value = DeleteFinally::new(["out.txt", "missing.txt"])
            .with_prefix(dir.path())
            .with_warn(false)
            .run(|| 42);
        assert_eq!(value, 42);
        assert!(!dir.path().join("out.txt").exists());
    }

    #[test]
    fn deletes_after_panic() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "x").unwrap();

        let cleanup = DeleteFinally::new([file.clone()]);
        let result = std::panic::catch_unwind(move || cleanup.run(|| panic!("boom")));
        assert!(result.is_err());
        assert!(!file.exists());
    }

    #[test]
    fn prefix_applies_to_all_paths() {
        let cleanup = DeleteFinally::new(["x", "y"]).with_prefix("/tmp/base");
        assert_eq!(
            cleanup.paths(),
            [PathBuf::from("/tmp/base/x"), PathBuf::from("/tmp/base/y")]
        );
        std::mem::forget(cleanup);
    }
}
