use std::{fs, path::Path};

use memmap2::Mmap;

use super::Backend;
use crate::{Error::OutOfBounds, Result};

/// Content of a file on disk, memory-mapped read-only.
///
/// Empty files are not mapped, since mapping zero bytes fails on some platforms.
#[derive(Debug)]
pub struct Physical {
    map: Option<Mmap>,
}

impl Physical {
    /// Maps the file at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] when the file cannot be opened or mapped.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = fs::File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Physical { map: None });
        }
        // The map is read-only; concurrent truncation by another process is outside our control.
        let map = unsafe { Mmap::map(&file) }?;
        Ok(Physical { map: Some(map) })
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let end = offset.checked_add(len).ok_or(OutOfBounds)?;
        self.data().get(offset..end).ok_or(OutOfBounds)
    }

    fn data(&self) -> &[u8] {
        self.map.as_deref().unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.data().len()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn maps_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Ar 0.0 0.0 0.0\n").unwrap();
        file.flush().unwrap();

        let physical = Physical::new(file.path()).unwrap();
        assert_eq!(physical.len(), 15);
        assert_eq!(physical.data_slice(0, 2).unwrap(), b"Ar");
        assert!(physical.data_slice(10, 10).is_err());
    }

    #[test]
    fn empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let physical = Physical::new(file.path()).unwrap();
        assert!(physical.is_empty());
        assert_eq!(physical.data(), b"");
    }

    #[test]
    fn missing_file() {
        let result = Physical::new("/nonexistent/path/to/file.xyz");
        assert!(matches!(result, Err(crate::Error::FileError(_))));
    }
}
