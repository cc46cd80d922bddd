//! Input file access and low-level parsing.
//!
//! A quarantine container is read exactly once per decode call, through a [`File`]. The file is
//! memory-mapped read-only, so decoders only fault in the pages they actually look at (most
//! signature checks touch the first few bytes) and can never modify the sample on disk.
//!
//! # Key Components
//!
//! - [`crate::file::File`] - Read-only view of one input, backed by disk or memory
//! - [`crate::file::Backend`] - Trait implemented by the storage backends
//! - [`crate::file::parser::Parser`] - Bounds-checked cursor used by every decoder
//! - [`crate::file::io`] - Endian-aware primitive reads
//!
//! # Usage Examples
//!
//! ```rust
//! use dexray::File;
//!
//! let file = File::from_mem(b"-chest- payload".to_vec())?;
//! assert_eq!(file.len(), 15);
//! assert_eq!(file.data_slice(0, 7)?, b"-chest-");
//! assert!(file.data_slice(10, 10).is_err());
//! # Ok::<(), dexray::Error>(())
//! ```

pub mod io;
pub mod parser;

mod memory;
mod physical;

use std::path::Path;

use crate::{Error::Empty, Result};
use memory::Memory;
use physical::Physical;

/// Backend trait for file data sources.
///
/// Implementations hand out immutable views of the input; `data_slice` must reject any
/// range that is not fully inside the data.
pub trait Backend: Send + Sync {
    /// Returns a slice of `len` bytes starting at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the data, including when
    /// `offset + len` overflows.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the complete data.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data.
    fn len(&self) -> usize;
}

/// Read-only view of one quarantine container.
pub struct File {
    data: Box<dyn Backend>,
}

impl File {
    /// Maps the file at `path` read-only.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped, and
    /// [`crate::Error::Empty`] for a zero-length file.
    pub fn from_file(path: &Path) -> Result<File> {
        let input = Physical::new(path)?;

        Self::load(input)
    }

    /// Wraps an in-memory buffer.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for an empty buffer.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        Ok(File {
            data: Box::new(data),
        })
    }

    /// Returns the total size of the file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the file has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the complete file contents.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// Returns a bounds-checked slice of the file.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the file.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File").field("len", &self.len()).finish()
    }
}
