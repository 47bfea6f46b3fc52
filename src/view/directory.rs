//! A directory tree as a [`Hierarchy`].

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    view::{Hierarchy, Node},
    Error, Result,
};

/// A regular file inside a [`DirectoryGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryFile {
    name: String,
    path: PathBuf,
}

impl DirectoryFile {
    /// `/`-separated path relative to the root directory, with a leading `/`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filesystem path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A directory on disk, walked as a group.
///
/// Sub-directories are groups and regular files are leaves; other entries are skipped.
/// Entries are ordered by file name. Symbolic links are followed.
///
/// # Examples
///
/// ```rust,no_run
/// use nanoutils::view::{DirectoryGroup, RecursiveKeysView};
///
/// let root = DirectoryGroup::open("tests/data")?;
/// for name in RecursiveKeysView::new(root).iter() {
///     println!("{}", name?);
/// }
/// # Ok::<(), nanoutils::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryGroup {
    root: Arc<PathBuf>,
    prefix: String,
}

impl DirectoryGroup {
    /// Opens `path` as the root group.
    ///
    /// # Errors
    /// Returns [`Error::Type`] when `path` exists but is not a directory and
    /// [`Error::FileError`] when it cannot be accessed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !fs::metadata(path)?.is_dir() {
            return Err(Error::Type(format!(
                "Expected a directory, got '{}'",
                path.display()
            )));
        }
        Ok(DirectoryGroup {
            root: Arc::new(path.to_path_buf()),
            prefix: String::new(),
        })
    }

    /// `/`-separated path relative to the root, `/` for the root itself.
    pub fn name(&self) -> &str {
        if self.prefix.is_empty() {
            "/"
        } else {
            &self.prefix
        }
    }

    /// Filesystem path of this directory.
    pub fn path(&self) -> PathBuf {
        self.prefix
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.as_ref().clone(), |path, part| path.join(part))
    }
}

impl Hierarchy for DirectoryGroup {
    type Leaf = DirectoryFile;

    fn children(&self) -> Result<Vec<Node<Self, DirectoryFile>>> {
        let mut entries = fs::read_dir(self.path())?.collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(fs::DirEntry::file_name);

        let mut children = Vec::with_capacity(entries.len());
        for entry in entries {
            let path = entry.path();
            let name = format!("{}/{}", self.prefix, entry.file_name().to_string_lossy());
            let metadata = fs::metadata(&path)?;
            if metadata.is_dir() {
                children.push(Node::Group(DirectoryGroup {
                    root: self.root.clone(),
                    prefix: name,
                }));
            } else if metadata.is_file() {
                children.push(Node::Leaf(DirectoryFile { name, path }));
            }
        }
        Ok(children)
    }

    fn leaf_name(leaf: &DirectoryFile) -> String {
        leaf.name.clone()
    }
}
