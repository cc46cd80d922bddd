//! Physical file backend for memory-mapped I/O.
//!
//! This module provides the [`crate::file::physical::Physical`] backend that implements the
//! [`crate::file::Backend`] trait for reading quarantine containers from disk using a read-only
//! memory map. Signature checks only touch the first bytes of a file, so mapping instead of
//! reading keeps the cost of rejecting a non-matching container independent of its size.
//!
//! The mapping is created from a file opened read-only; the sample on disk is never written.

use super::Backend;
use crate::{
    Error::{Empty, Error, FileError},
    Result,
};

use memmap2::Mmap;
use std::{fs, path::Path};

/// Backend mapping a file on disk.
#[derive(Debug)]
pub struct Physical {
    data: Mmap,
}

impl Physical {
    /// Opens and maps the file at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened and
    /// [`crate::Error::Error`] if it cannot be mapped. An empty file yields [`crate::Error::Empty`].
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) => return Err(FileError(error)),
        };

        // A zero-length file cannot be mapped on every platform
        if file.metadata().map_err(FileError)?.len() == 0 {
            return Err(Empty);
        }

        // The sample is opened read-only and the mapping is never exposed mutably.
        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(error) => return Err(Error(error.to_string())),
        };

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(out_of_bounds_error!());
        };

        if offset_end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn physical() {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        temp.write_all(&[0x4D, 0x5A, 0x90, 0x00, 0x03]).unwrap();
        temp.flush().unwrap();

        let physical = Physical::new(temp.path()).unwrap();

        assert_eq!(physical.len(), 5);
        assert_eq!(physical.data()[0], 0x4D);
        assert_eq!(physical.data_slice(2, 3).unwrap(), &[0x90, 0x00, 0x03]);

        if physical
            .data_slice(u32::MAX as usize, u32::MAX as usize)
            .is_ok()
        {
            panic!("This should not work!")
        }

        if physical.data_slice(0, 6).is_ok() {
            panic!("This should not work!")
        }
    }

    #[test]
    fn physical_empty_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(Physical::new(temp.path()), Err(Empty)));
    }

    #[test]
    fn physical_invalid_file_path() {
        let result = Physical::new(PathBuf::from("/nonexistent/path/to/file.bup"));
        match result {
            Err(FileError(io_error)) => {
                assert_eq!(io_error.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected FileError"),
        }
    }
}
