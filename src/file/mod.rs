//! Reading and writing line-oriented file formats.
//!
//! Content is obtained through a [`Backend`]: [`Physical`] memory-maps a file on disk and
//! [`Memory`] holds an owned buffer. [`FileContainer`] is the scaffolding for types that are
//! parsed from and written back to text files; implementors describe the line format and get
//! [`FileContainer::read`] and [`FileContainer::write`] for every kind of source and target.
//!
//! # Examples
//!
//! ```rust
//! use nanoutils::file::{FileContainer, FileSource, FileTarget};
//! use std::io::Write;
//!
//! #[derive(Debug, PartialEq)]
//! struct Names(Vec<String>);
//!
//! impl FileContainer for Names {
//!     fn read_lines(lines: &mut dyn Iterator<Item = &str>) -> nanoutils::Result<Self> {
//!         Ok(Names(lines.map(str::to_string).collect()))
//!     }
//!
//!     fn write_lines(&self, writer: &mut dyn Write) -> nanoutils::Result<()> {
//!         for name in &self.0 {
//!             writeln!(writer, "{name}")?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let names = Names::read(FileSource::Bytes(b"H\nHe\n".to_vec()))?;
//! assert_eq!(names, Names(vec!["H".into(), "He".into()]));
//!
//! let mut out = Vec::new();
//! names.write(FileTarget::Writer(&mut out))?;
//! assert_eq!(out, b"H\nHe\n");
//! # Ok::<(), nanoutils::Error>(())
//! ```

mod memory;
mod physical;

use std::{
    fmt,
    fs,
    io::{self, BufWriter, Read, Write},
    path::PathBuf,
};

use tracing::debug;

use crate::Result;

pub use memory::Memory;
pub use physical::Physical;

/// Byte access to loaded content.
pub trait Backend: Send + Sync {
    /// `len` bytes starting at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] when the range leaves the content.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// The whole content.
    fn data(&self) -> &[u8];

    /// Content length in bytes.
    fn len(&self) -> usize;

    /// Whether the content is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Where [`FileContainer::read`] takes its content from.
pub enum FileSource {
    /// A file on disk, memory-mapped
    Path(PathBuf),
    /// An in-memory buffer
    Bytes(Vec<u8>),
    /// Any reader, drained to the end
    Reader(Box<dyn Read>),
}

impl FileSource {
    /// Loads the content into a backend.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] when the content cannot be read.
    pub fn load(self) -> Result<Box<dyn Backend>> {
        Ok(match self {
            FileSource::Path(path) => {
                debug!(path = %path.display(), "mapping file");
                Box::new(Physical::new(path)?)
            }
            FileSource::Bytes(bytes) => Box::new(Memory::new(bytes)),
            FileSource::Reader(reader) => Box::new(Memory::from_reader(reader)?),
        })
    }
}

impl From<PathBuf> for FileSource {
    fn from(path: PathBuf) -> Self {
        FileSource::Path(path)
    }
}

impl From<&std::path::Path> for FileSource {
    fn from(path: &std::path::Path) -> Self {
        FileSource::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for FileSource {
    fn from(bytes: Vec<u8>) -> Self {
        FileSource::Bytes(bytes)
    }
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            FileSource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            FileSource::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// Where [`FileContainer::write`] sends its content.
pub enum FileTarget<'a> {
    /// A file on disk, created or truncated
    Path(PathBuf),
    /// Any writer; it is flushed but not closed
    Writer(&'a mut dyn Write),
}

impl From<PathBuf> for FileTarget<'_> {
    fn from(path: PathBuf) -> Self {
        FileTarget::Path(path)
    }
}

impl<'a, W: Write> From<&'a mut W> for FileTarget<'a> {
    fn from(writer: &'a mut W) -> Self {
        FileTarget::Writer(writer)
    }
}

/// A type parsed from, and written back to, a line-oriented text file.
///
/// Implementors provide [`FileContainer::read_lines`] and [`FileContainer::write_lines`];
/// everything else is provided.
pub trait FileContainer: Sized {
    /// Builds an instance from the lines of a file, without line terminators.
    ///
    /// # Errors
    /// Implementors report malformed content.
    fn read_lines(lines: &mut dyn Iterator<Item = &str>) -> Result<Self>;

    /// Writes the instance to `writer`.
    ///
    /// # Errors
    /// Implementors report write failures.
    fn write_lines(&self, writer: &mut dyn Write) -> Result<()>;

    /// Adjusts a freshly read instance. Does nothing unless overridden.
    ///
    /// # Errors
    /// Implementors report inconsistent content.
    fn read_postprocess(&mut self) -> Result<()> {
        Ok(())
    }

    /// Reads an instance from `source`: loads the content, decodes it as UTF-8, splits it
    /// into lines and post-processes the result.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] or [`crate::Error::Utf8`] when loading or decoding
    /// fails, and any error of [`FileContainer::read_lines`] or
    /// [`FileContainer::read_postprocess`].
    fn read(source: impl Into<FileSource>) -> Result<Self> {
        let backend = source.into().load()?;
        let text = std::str::from_utf8(backend.data())?;
        let mut ret = Self::read_lines(&mut text.lines())?;
        ret.read_postprocess()?;
        Ok(ret)
    }

    /// Writes the instance to `target`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] when the target cannot be created or written, and
    /// any error of [`FileContainer::write_lines`].
    fn write<'a>(&self, target: impl Into<FileTarget<'a>>) -> Result<()> {
        match target.into() {
            FileTarget::Path(path) => {
                debug!(path = %path.display(), "writing file");
                let mut writer = BufWriter::new(fs::File::create(path)?);
                self.write_lines(&mut writer)?;
                writer.flush()?;
            }
            FileTarget::Writer(writer) => {
                self.write_lines(writer)?;
                writer.flush()?;
            }
        }
        Ok(())
    }
}

/// Collects the lines a container writes, for comparison in tests and logging.
///
/// # Errors
/// Returns any error of [`FileContainer::write_lines`], or [`crate::Error::Utf8`] when the
/// output is not UTF-8.
pub fn to_text<C: FileContainer>(container: &C) -> Result<String> {
    let mut buffer = io::Cursor::new(Vec::new());
    container.write_lines(&mut buffer)?;
    Ok(std::str::from_utf8(buffer.get_ref())?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[derive(Debug, PartialEq)]
    struct Xyz {
        atoms: Vec<(String, [f64; 3])>,
        comment: String,
    }

    impl FileContainer for Xyz {
        fn read_lines(lines: &mut dyn Iterator<Item = &str>) -> Result<Self> {
            let count: usize = lines
                .next()
                .and_then(|line| line.trim().parse().ok())
                .ok_or_else(|| Error::Value("missing atom count".into()))?;
            let comment = lines.next().unwrap_or_default().to_string();
            let mut atoms = Vec::with_capacity(count);
            for line in lines.take(count) {
                let mut fields = line.split_whitespace();
                let symbol = fields.next().unwrap_or_default().to_string();
                let mut xyz = [0.0; 3];
                for coord in &mut xyz {
                    *coord = fields
                        .next()
                        .and_then(|field| field.parse().ok())
                        .ok_or_else(|| Error::Value(format!("bad coordinates: {line}")))?;
                }
                atoms.push((symbol, xyz));
            }
            Ok(Xyz { atoms, comment })
        }

        fn write_lines(&self, writer: &mut dyn Write) -> Result<()> {
            writeln!(writer, "{}", self.atoms.len())?;
            writeln!(writer, "{}", self.comment)?;
            for (symbol, [x, y, z]) in &self.atoms {
                writeln!(writer, "{symbol} {x:.1} {y:.1} {z:.1}")?;
            }
            Ok(())
        }

        fn read_postprocess(&mut self) -> Result<()> {
            self.comment = self.comment.trim().to_string();
            Ok(())
        }
    }

    const WATER: &str = "3\n  water  \nO 0.0 0.0 0.0\nH 1.0 0.0 0.0\nH 0.0 1.0 0.0\n";

    #[test]
    fn read_from_bytes_and_reader() {
        let from_bytes = Xyz::read(WATER.as_bytes().to_vec()).unwrap();
        assert_eq!(from_bytes.atoms.len(), 3);
        assert_eq!(from_bytes.comment, "water");

        let from_reader = Xyz::read(FileSource::Reader(Box::new(WATER.as_bytes()))).unwrap();
        assert_eq!(from_reader, from_bytes);
    }

    #[test]
    fn path_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("water.xyz");
        fs::write(&path, WATER).unwrap();

        let water = Xyz::read(path.clone()).unwrap();
        water.write(path.clone()).unwrap();
        assert_eq!(Xyz::read(path).unwrap(), water);
        assert!(to_text(&water).unwrap().starts_with("3\nwater\nO 0.0"));
    }

    #[test]
    fn decoding_and_parse_errors() {
        assert!(matches!(
            Xyz::read(vec![0xff, 0xfe]),
            Err(Error::Utf8(_))
        ));
        assert!(matches!(
            Xyz::read(b"x\n".to_vec()),
            Err(Error::Value(_))
        ));
        assert!(matches!(
            Xyz::read(PathBuf::from("/nonexistent/water.xyz")),
            Err(Error::FileError(_))
        ));
    }
}
