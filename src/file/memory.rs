use std::io::Read;

use super::Backend;
use crate::{Error::OutOfBounds, Result};

/// Content held in an owned buffer.
#[derive(Debug, Default)]
pub struct Memory {
    buffer: Vec<u8>,
}

impl Memory {
    /// Wraps `buffer`.
    pub fn new(buffer: Vec<u8>) -> Memory {
        Memory { buffer }
    }

    /// Drains `reader` into a new buffer.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] when reading fails.
    pub fn from_reader(mut reader: impl Read) -> Result<Memory> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Ok(Memory { buffer })
    }
}

impl Backend for Memory {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let end = offset.checked_add(len).ok_or(OutOfBounds)?;
        self.buffer.get(offset..end).ok_or(OutOfBounds)
    }

    fn data(&self) -> &[u8] {
        &self.buffer
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }
}
