// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # dexray
//!
//! Recovery of original files and metadata from antivirus quarantine containers.
//!
//! Antivirus products do not delete what they detect; they move it into a quarantine
//! container of their own design, lightly obfuscated so that the stored copy is inert, together
//! with bookkeeping metadata such as the original path, the detection name and the time of the
//! detection. `dexray` recognises these containers, undoes the obfuscation and hands back the
//! original files and the metadata.
//!
//! ## Supported Formats
//!
//! | Vendor            | Container                         | Payload | Metadata |
//! |-------------------|-----------------------------------|---------|----------|
//! | AhnLab V3         | `.vir`, repeating XOR             | yes     | yes      |
//! | Avast / AVG       | virus chest, RC4                  | yes     | no       |
//! | McAfee            | `.bup` compound file, XOR `0x6A`  | yes     | yes      |
//! | Windows Defender  | `ResourceData` / `Entries`, RC4   | yes     | yes      |
//! | TrendMicro        | VSBX, XOR `0xFF`                  | yes     | yes      |
//!
//! ## Features
//!
//! - **Untrusted input** - every container length and offset goes through a bounds-checked
//!   [`Parser`]; damaged containers are reported, never panicked on
//! - **Read-only input** - the sample is memory-mapped read-only and never modified
//! - **All-or-nothing output** - recovered files are written to a temporary name first and
//!   only appear in the scratch directory once complete
//! - **Order independent** - a format hint only changes which decoder is tried first
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dexray::prelude::*;
//!
//! let input = QuarantineInput::new(
//!     "samples/eicar.bup",
//!     "3395856ce81f2b7382dee72602f798b642f14140",
//!     "/tmp/scratch",
//!     "quarantine/mcafee",
//! );
//!
//! let extraction = decode_quarantine(&input)?;
//! for entry in &extraction.entries {
//!     println!("{} -> {}", entry.display_name, entry.stored_path.display());
//! }
//! println!("{}", extraction.metadata.to_json()?);
//! # Ok::<(), dexray::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`file`] - Read-only input access and the bounds-checked [`Parser`]
//! - [`deobfuscation`] - XOR and RC4 transforms
//! - [`quarantine`] - One decoder per vendor, the [`Dispatcher`] and the result types
//! - [`config`] - [`DecoderConfig`] presets
//! - [`report`] - Display-safe names, the extraction limit and result reports
//!
//! Decoding never touches the filesystem before a container has been parsed completely, so a
//! container rejected halfway leaves nothing behind. The only errors a decode call returns are
//! I/O errors; a damaged container is recorded as a [`Diagnostic`] and the next decoder runs.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result):
//!
//! ```rust,no_run
//! use dexray::{decode_quarantine, Error, QuarantineInput};
//!
//! let input = QuarantineInput::new("sample.vir", "abc123", "/tmp/scratch", "");
//! match decode_quarantine(&input) {
//!     Ok(extraction) if extraction.is_empty() => println!("Not a known quarantine container"),
//!     Ok(extraction) => println!("Recovered {} files", extraction.entries.len()),
//!     Err(Error::FileError(io_error)) => println!("I/O error: {}", io_error),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Development and Testing
//!
//! ### Fuzzing
//!
//! ```bash
//! # Install fuzzing tools
//! cargo install cargo-fuzz
//!
//! # Run fuzzer
//! cargo +nightly fuzz run containers --release
//!
//! # Multi-core fuzzing
//! cargo +nightly fuzz run containers --release -- -jobs=4 -fork=1
//! ```
//!
//! ### Testing
//!
//! ```bash
//! cargo test
//! cargo bench
//! ```

// The shared test builders name the crate `dexray` from unit and integration tests alike
#[cfg(test)]
extern crate self as dexray;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use dexray::prelude::*;
///
/// let input = QuarantineInput::new("sample.bin", "abc123", "/tmp/scratch", "");
/// let extraction = Dispatcher::new(DecoderConfig::exhaustive()).decode(&input)?;
/// # Ok::<(), dexray::Error>(())
/// ```
pub mod prelude;

/// Read-only input access and bounds-checked parsing.
///
/// # Key Components
///
/// - [`File`] - A memory-mapped or in-memory input
/// - [`Parser`] - Cursor over a byte slice that never reads out of bounds
/// - [`file::io`] - Offset-addressed little- and big-endian reads
pub mod file;

/// Byte transforms that undo a vendor's obfuscation.
///
/// Every transform is length-preserving and self-inverse; see [`deobfuscation::Transform`].
pub mod deobfuscation;

/// Vendor decoders, the dispatcher and the decode result types.
///
/// # Key Types
///
/// - [`Vendor`] - The supported container formats
/// - [`QuarantineInput`] - What to decode and where to write recovered files
/// - [`Extraction`] - Recovered files and metadata
/// - [`Dispatcher`] - Runs the decoders in priority order
///
/// # Examples
///
/// ```rust
/// use dexray::{quarantine::ahnlab, Vendor};
///
/// // A file with a foreign signature is not an AhnLab container
/// assert!(Vendor::AhnLab.parse(b"PK\x03\x04")?.is_none());
/// assert_eq!(ahnlab::MAGIC, b"AhnLab Inc. 2006");
/// # Ok::<(), dexray::Error>(())
/// ```
pub mod quarantine;

/// Decoder configuration presets.
pub mod config;

/// Host-side helpers for presenting an [`Extraction`].
pub mod report;

/// `dexray` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
///
/// # Examples
///
/// ```rust,no_run
/// use dexray::{Extraction, QuarantineInput, Result};
///
/// fn recover(path: &str) -> Result<Extraction> {
///     dexray::decode_quarantine(&QuarantineInput::new(path, "abc123", "/tmp/scratch", ""))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `dexray` Error type
///
/// The main error type for all operations in this crate. Container problems are absorbed by
/// the dispatcher; a decode call itself only fails on I/O.
pub use error::Error;

/// Configuration of a [`Dispatcher`].
pub use config::DecoderConfig;

/// Input access.
pub use file::{parser::Parser, File};

/// Decoding entry points and result types.
pub use quarantine::{
    decode_quarantine, DecodeOutcome, Diagnostic, Dispatcher, ExtractedEntry, Extraction,
    MetaValue, Metadata, QuarantineInput, Vendor,
};
