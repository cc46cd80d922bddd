//! Results of decoding a quarantine container.

use std::path::PathBuf;

use serde::Serialize;

use crate::quarantine::{Metadata, Vendor};

/// A recovered file, written to the scratch directory.
///
/// The file at `stored_path` is complete and closed. Ownership moves to the caller, who
/// decides whether to keep or delete it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedEntry {
    /// Location of the recovered file inside the scratch directory
    pub stored_path: PathBuf,
    /// Best-effort original file name
    pub display_name: String,
    /// Provenance note, e.g. `Recovered from AhnLab quarantine`
    pub description: String,
}

impl ExtractedEntry {
    pub(crate) fn new(stored_path: PathBuf, name: Option<&str>, vendor: Vendor) -> Self {
        let display_name = match name.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => name.to_string(),
            None => stored_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        ExtractedEntry {
            stored_path,
            display_name,
            description: format!("Recovered from {vendor} quarantine"),
        }
    }
}

/// What a single vendor decoder made of an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// The signature did not match; the input is not this vendor's container
    NoMatch,
    /// The container was decoded
    Success {
        /// Recovered files, in container order
        entries: Vec<ExtractedEntry>,
        /// Recovered metadata
        metadata: Metadata,
    },
    /// The signature matched but the structure is damaged; nothing was written
    Malformed(String),
}

impl DecodeOutcome {
    /// Returns true for a success carrying at least one entry or metadata field.
    #[must_use]
    pub fn is_useful(&self) -> bool {
        match self {
            DecodeOutcome::Success { entries, metadata } => {
                !entries.is_empty() || !metadata.is_empty()
            }
            _ => false,
        }
    }
}

/// A decoder that recognised the input but could not decode it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The decoder
    pub vendor: Vendor,
    /// Why the container was rejected
    pub reason: String,
}

/// The combined result of a decode call.
///
/// At most one vendor contributes entries and metadata. An input no decoder recognises yields
/// an empty extraction, which is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    /// Recovered files
    pub entries: Vec<ExtractedEntry>,
    /// Recovered metadata
    pub metadata: Metadata,
    /// The vendor whose decoder produced the result
    pub vendor: Option<Vendor>,
    /// Decoders that matched a signature but rejected the container
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    /// Returns true if nothing was recovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.metadata.is_empty()
    }
}
