//! Vendor quarantine container decoders.
//!
//! Each supported antivirus product stores detected files in its own container format. This
//! module holds one decoder per format behind the closed [`Vendor`] enum, the types a decode
//! call produces, and the [`Dispatcher`] that tries the decoders in turn.
//!
//! # Architecture
//!
//! Decoding is split in two steps:
//!
//! 1. [`Vendor::parse`] works on the container bytes alone. It checks the vendor signature
//!    first and returns `Ok(None)` on a mismatch; once the signature matched, every container
//!    field goes through the bounds-checked [`crate::Parser`] and the result is a fully
//!    decoded [`Recovered`] value held in memory.
//! 2. [`Vendor::attempt`] turns that into a [`DecodeOutcome`]: format errors become
//!    [`DecodeOutcome::Malformed`], and recovered payloads are written to the scratch directory
//!    through a [`ScratchWriter`].
//!
//! Nothing is written before parsing has finished, so a container rejected as malformed never
//! leaves files behind.
//!
//! # Key Components
//!
//! - [`Vendor`] - The supported formats and their decoders
//! - [`QuarantineInput`] - Description of one input
//! - [`DecodeOutcome`] / [`Extraction`] - Per-decoder and combined results
//! - [`Metadata`] - Flat metadata mapping
//! - [`Dispatcher`] - Tries every enabled decoder in priority order
//!
//! # Usage Examples
//!
//! ```rust
//! use dexray::{deobfuscation::Transform, Vendor};
//!
//! // A TrendMicro container is XOR-ed with 0xFF as a whole
//! let mut plain = b"VSBX".to_vec();
//! plain.extend_from_slice(&10u32.to_le_bytes()); // payload offset
//! plain.extend_from_slice(&0u16.to_le_bytes()); // no tags
//! plain.extend_from_slice(b"MZ");
//! let container = Transform::Xor(0xFF).decode(&plain);
//!
//! let recovered = Vendor::TrendMicro.parse(&container)?.expect("signature matches");
//! assert_eq!(recovered.payloads[0].data, b"MZ");
//! assert!(Vendor::AhnLab.parse(&container)?.is_none());
//! # Ok::<(), dexray::Error>(())
//! ```

pub mod ahnlab;
pub mod avast;
pub mod defender;
pub mod dispatcher;
pub mod mcafee;
pub mod trendmicro;

mod input;
mod metadata;
mod outcome;
mod writer;

pub use dispatcher::{decode_quarantine, Dispatcher};
pub use input::QuarantineInput;
pub use metadata::{MetaValue, Metadata};
pub use outcome::{DecodeOutcome, Diagnostic, ExtractedEntry, Extraction};
pub use writer::ScratchWriter;

pub(crate) use metadata::{file_name_of, metadata_key};

use serde::Serialize;
use strum::{EnumCount, EnumIter};

use crate::Result;

/// The supported quarantine formats, in the order the dispatcher tries them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, strum::Display, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// AhnLab V3 quarantine (`.vir`)
    #[strum(to_string = "AhnLab")]
    AhnLab,
    /// Avast and AVG virus chest
    #[strum(to_string = "Avast/AVG")]
    AvastAvg,
    /// McAfee `.bup` backup files
    #[strum(to_string = "McAfee BUP")]
    McAfeeBup,
    /// Windows Defender `ResourceData` and `Entries` files
    #[strum(to_string = "Windows Defender")]
    Defender,
    /// TrendMicro VSBX quarantine
    #[strum(to_string = "TrendMicro")]
    TrendMicro,
}

impl Vendor {
    /// Short lowercase tag used in recovered file names.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Vendor::AhnLab => "ahnlab",
            Vendor::AvastAvg => "avastavg",
            Vendor::McAfeeBup => "mcafeebup",
            Vendor::Defender => "defender",
            Vendor::TrendMicro => "trendmicro",
        }
    }

    /// Map an upstream type tag such as `quarantine/mcafee` to a vendor.
    ///
    /// Returns `None` for empty or unknown hints.
    #[must_use]
    pub fn from_hint(hint: &str) -> Option<Vendor> {
        let hint = hint.trim().to_ascii_lowercase();
        let hint = hint.strip_prefix("quarantine/").unwrap_or(&hint);

        if hint.is_empty() {
            None
        } else if hint.contains("ahnlab") {
            Some(Vendor::AhnLab)
        } else if hint.contains("avast") || hint.contains("avg") {
            Some(Vendor::AvastAvg)
        } else if hint.contains("mcafee") {
            Some(Vendor::McAfeeBup)
        } else if hint.contains("defender") || hint.contains("microsoft") {
            Some(Vendor::Defender)
        } else if hint.contains("trend") {
            Some(Vendor::TrendMicro)
        } else {
            None
        }
    }

    /// Decode a container held in memory.
    ///
    /// Returns `Ok(None)` if the signature of this vendor's format does not match.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] if the signature
    /// matched but the container structure is invalid.
    pub fn parse(self, data: &[u8]) -> Result<Option<Recovered>> {
        match self {
            Vendor::AhnLab => ahnlab::parse(data),
            Vendor::AvastAvg => avast::parse(data),
            Vendor::McAfeeBup => mcafee::parse(data),
            Vendor::Defender => defender::parse(data),
            Vendor::TrendMicro => trendmicro::parse(data),
        }
    }

    /// Decode the container `data` read from `input` and write its payloads to the scratch
    /// directory.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if a payload cannot be written. Container problems
    /// are reported as [`DecodeOutcome::Malformed`] instead.
    pub fn attempt(self, input: &QuarantineInput, data: &[u8]) -> Result<DecodeOutcome> {
        let recovered = match self.parse(data) {
            Ok(Some(recovered)) => recovered,
            Ok(None) => {
                log::trace!("{}: no {self} signature", input.file_path.display());
                return Ok(DecodeOutcome::NoMatch);
            }
            Err(error) if error.is_format_error() => {
                log::debug!(
                    "{}: {self} container rejected: {error}",
                    input.file_path.display()
                );
                return Ok(DecodeOutcome::Malformed(error.to_string()));
            }
            Err(error) => return Err(error),
        };

        recovered.finish(input, self)
    }
}

/// A payload recovered from a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// The deobfuscated file content
    pub data: Vec<u8>,
    /// Original file name, if the container records one
    pub name: Option<String>,
}

impl Payload {
    pub(crate) fn new(data: Vec<u8>, name: Option<&str>) -> Self {
        Payload {
            data,
            name: name.map(str::to_string),
        }
    }
}

/// A fully decoded container, not yet written anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recovered {
    /// Payloads in container order
    pub payloads: Vec<Payload>,
    /// Metadata recorded by the container
    pub metadata: Metadata,
}

impl Recovered {
    /// Write the payloads into the scratch directory of `input`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if writing fails; payloads already written for this
    /// container are removed again.
    pub fn finish(self, input: &QuarantineInput, vendor: Vendor) -> Result<DecodeOutcome> {
        let mut writer = ScratchWriter::new(&input.scratch_dir, &input.content_hash, vendor);
        let mut entries = Vec::with_capacity(self.payloads.len());

        for payload in &self.payloads {
            let stored_path = writer.write(&payload.data)?;
            entries.push(ExtractedEntry::new(
                stored_path,
                payload.name.as_deref(),
                vendor,
            ));
        }
        writer.commit();

        Ok(DecodeOutcome::Success {
            entries,
            metadata: self.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn hints() {
        assert_eq!(Vendor::from_hint("quarantine/ahnlab"), Some(Vendor::AhnLab));
        assert_eq!(Vendor::from_hint("quarantine/avast"), Some(Vendor::AvastAvg));
        assert_eq!(Vendor::from_hint("AVG"), Some(Vendor::AvastAvg));
        assert_eq!(Vendor::from_hint("quarantine/mcafee"), Some(Vendor::McAfeeBup));
        assert_eq!(Vendor::from_hint("defender"), Some(Vendor::Defender));
        assert_eq!(Vendor::from_hint("Microsoft"), Some(Vendor::Defender));
        assert_eq!(Vendor::from_hint("trendmicro"), Some(Vendor::TrendMicro));
        assert_eq!(Vendor::from_hint("quarantine/"), None);
        assert_eq!(Vendor::from_hint("quarantine/kaspersky"), None);
    }

    #[test]
    fn tags_match_serialisation() {
        assert_eq!(Vendor::COUNT, 5);
        for vendor in Vendor::iter() {
            let json = serde_json::to_string(&vendor).unwrap();
            assert_eq!(json, format!("\"{}\"", vendor.tag()));
            assert_eq!(Vendor::from_hint(vendor.tag()), Some(vendor));
        }
    }

    #[test]
    fn no_vendor_matches_plain_data() {
        let data = b"This is not a quarantine container at all".repeat(20);
        for vendor in Vendor::iter() {
            assert!(vendor.parse(&data).unwrap().is_none(), "{vendor} matched");
        }
    }

    #[test]
    fn attempt_without_match_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = QuarantineInput::new("x", "abc", dir.path(), "");

        for vendor in Vendor::iter() {
            let outcome = vendor.attempt(&input, b"plain text").unwrap();
            assert_eq!(outcome, DecodeOutcome::NoMatch);
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
