//! The per-call description of a quarantine container to decode.

use std::path::{Path, PathBuf};

/// Everything a decode call needs to know about one input.
///
/// The input is immutable for the duration of a call. Nothing is read from process-wide state:
/// the content hash names the recovered files and the scratch directory receives them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarantineInput {
    /// The quarantine container on disk
    pub file_path: PathBuf,
    /// Content hash of the container, used to name recovered files
    pub content_hash: String,
    /// Caller-owned directory receiving recovered files
    pub scratch_dir: PathBuf,
    /// Upstream type tag such as `quarantine/mcafee`, possibly empty
    pub format_hint: String,
}

impl QuarantineInput {
    /// Describe an input.
    ///
    /// ## Arguments
    /// * `file_path`    - The container to decode
    /// * `content_hash` - Hash of the container's content
    /// * `scratch_dir`  - Writable directory for recovered files
    /// * `format_hint`  - Advisory vendor tag, `""` if unknown
    pub fn new(
        file_path: impl Into<PathBuf>,
        content_hash: impl Into<String>,
        scratch_dir: impl Into<PathBuf>,
        format_hint: impl Into<String>,
    ) -> Self {
        QuarantineInput {
            file_path: file_path.into(),
            content_hash: content_hash.into(),
            scratch_dir: scratch_dir.into(),
            format_hint: format_hint.into(),
        }
    }

    /// Returns the hint with any `quarantine/` prefix removed.
    #[must_use]
    pub fn vendor_hint(&self) -> &str {
        let hint = self.format_hint.trim();
        hint.strip_prefix("quarantine/").unwrap_or(hint)
    }

    /// Returns the container path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_prefix_is_stripped() {
        let input = QuarantineInput::new("a.bup", "abc", "/tmp", "quarantine/mcafee");
        assert_eq!(input.vendor_hint(), "mcafee");

        let input = QuarantineInput::new("a.bup", "abc", "/tmp", " defender ");
        assert_eq!(input.vendor_hint(), "defender");

        let input = QuarantineInput::new("a.bup", "abc", "/tmp", "");
        assert_eq!(input.vendor_hint(), "");
    }
}
