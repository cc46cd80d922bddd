//! Writing recovered payloads into the scratch directory.
//!
//! Every payload is first written to a uniquely named temporary file inside the scratch
//! directory and only renamed to its final name once it is complete, so the scratch directory
//! never holds a partially written payload under a final name. If a later payload of the same
//! container fails to write, the files already persisted for that container are removed again:
//! a decode call either hands out all of its files or none of them.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::{quarantine::Vendor, Result};

/// Writes the payloads of one container.
pub struct ScratchWriter<'a> {
    scratch_dir: &'a Path,
    stem: String,
    vendor: Vendor,
    written: Vec<PathBuf>,
    committed: bool,
}

impl<'a> ScratchWriter<'a> {
    /// Prepare a writer for the payloads `vendor` recovered from the container with
    /// `content_hash`.
    pub fn new(scratch_dir: &'a Path, content_hash: &str, vendor: Vendor) -> Self {
        ScratchWriter {
            scratch_dir,
            stem: file_stem(content_hash),
            vendor,
            written: Vec::new(),
            committed: false,
        }
    }

    /// Final path of the payload with the given index.
    #[must_use]
    pub fn target(&self, index: usize) -> PathBuf {
        self.scratch_dir
            .join(format!("{}.{}.{}", self.stem, self.vendor.tag(), index))
    }

    /// Write the next payload and return its final path.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the scratch directory is not writable.
    pub fn write(&mut self, data: &[u8]) -> Result<PathBuf> {
        let target = self.target(self.written.len());

        let mut temp = NamedTempFile::new_in(self.scratch_dir)?;
        temp.write_all(data)?;
        temp.flush()?;
        temp.persist(&target).map_err(|error| error.error)?;

        self.written.push(target.clone());
        Ok(target)
    }

    /// Hand the written files over to the caller.
    pub fn commit(mut self) -> Vec<PathBuf> {
        self.committed = true;
        std::mem::take(&mut self.written)
    }
}

impl Drop for ScratchWriter<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        for path in &self.written {
            if let Err(error) = fs::remove_file(path) {
                log::warn!("could not remove {}: {error}", path.display());
            }
        }
    }
}

/// Reduce a content hash to characters that are safe in a file name.
fn file_stem(content_hash: &str) -> String {
    let stem: String = content_hash
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();

    if stem.is_empty() {
        "sample".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_hash_vendor_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ScratchWriter::new(dir.path(), "ab12", Vendor::AhnLab);

        let first = writer.write(b"MZ").unwrap();
        let second = writer.write(b"PK").unwrap();
        let paths = writer.commit();

        assert_eq!(first, dir.path().join("ab12.ahnlab.0"));
        assert_eq!(second, dir.path().join("ab12.ahnlab.1"));
        assert_eq!(paths, vec![first.clone(), second]);
        assert_eq!(fs::read(first).unwrap(), b"MZ");
    }

    #[test]
    fn uncommitted_files_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let mut writer = ScratchWriter::new(dir.path(), "ab12", Vendor::TrendMicro);
            writer.write(b"payload").unwrap()
        };

        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn hash_is_sanitised() {
        assert_eq!(file_stem("../../etc/passwd"), "etcpasswd");
        assert_eq!(file_stem("d41d8cd9"), "d41d8cd9");
        assert_eq!(file_stem("/.."), "sample");
    }

    #[test]
    fn missing_scratch_dir_is_a_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let mut writer = ScratchWriter::new(&missing, "ab12", Vendor::AhnLab);

        assert!(matches!(
            writer.write(b"MZ"),
            Err(crate::Error::FileError(_))
        ));
    }
}
