//! Cursor-based byte stream parser for quarantine containers.
//!
//! This module provides the [`crate::file::parser::Parser`] type, the Safe Reader every vendor
//! decoder routes its container fields through. A quarantined file is adversarial input: its
//! length and offset fields are attacker controlled, so every navigation and read operation here
//! validates data availability before touching the buffer and reports
//! [`crate::Error::OutOfBounds`] instead of panicking.
//!
//! # Key Components
//!
//! ## Navigation Methods
//! - [`crate::file::parser::Parser::seek`] - Move to specific position
//! - [`crate::file::parser::Parser::advance_by`] - Move forward by specified bytes
//! - [`crate::file::parser::Parser::align`] - Align to byte boundaries
//! - [`crate::file::parser::Parser::pos`] - Get current position
//!
//! ## Data Access Methods
//! - [`crate::file::parser::Parser::read_le`] - Read primitive types (little-endian)
//! - [`crate::file::parser::Parser::read_be`] - Read primitive types (big-endian)
//! - [`crate::file::parser::Parser::read_bytes`] - Borrow a length-checked slice
//! - [`crate::file::parser::Parser::slice_remaining`] - Borrow everything after the cursor
//!
//! ## String Reading Methods
//! - [`crate::file::parser::Parser::read_cstring`] - NUL-terminated 8-bit string
//! - [`crate::file::parser::Parser::read_utf16z`] - NUL-terminated UTF-16LE string
//!
//! # Usage Examples
//!
//! ```rust
//! use dexray::Parser;
//!
//! let data = [0x04, 0x00, 0x00, 0x00, b'e', b'v', b'i', b'l'];
//! let mut parser = Parser::new(&data);
//!
//! let length = parser.read_le::<u32>()? as usize;
//! let name = parser.read_bytes(length)?;
//! assert_eq!(name, b"evil");
//! assert!(!parser.has_more_data());
//!
//! // A container claiming more data than is present is rejected
//! let mut parser = Parser::new(&[0xFF, 0xFF, 0x00, 0x00]);
//! let length = parser.read_le::<u32>()? as usize;
//! assert!(parser.read_bytes(length).is_err());
//! # Ok::<(), dexray::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! [`crate::file::parser::Parser`] is [`Send`] and [`Sync`] since it only holds a shared
//! reference to the data and a position. Each decode call creates its own parsers.

use widestring::U16Str;

use crate::{
    file::io::{read_be_at, read_le_at, ByteIO},
    Result,
};

/// A bounds-checked cursor over an immutable byte slice.
///
/// The parser never copies the underlying data; slices handed out by
/// [`Parser::read_bytes`] borrow from the original buffer for its full lifetime `'a`.
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`Parser`] positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the underlying data is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the cursor to an absolute position.
    ///
    /// Seeking to exactly the end of the data is allowed, it leaves an empty remainder.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `pos` lies beyond the end of the data.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the cursor forward by `step` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if that would move past the end of the data.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        self.position = self.calc_end_position(step)?;
        Ok(())
    }

    /// Get the current position of the parser within the data.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the full underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Number of bytes between the cursor and the end of the data.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Compute `pos + length`, rejecting overflow and positions past the end.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the end position is not inside the data.
    pub fn calc_end_position(&self, length: usize) -> Result<usize> {
        let end = self
            .position
            .checked_add(length)
            .ok_or(out_of_bounds_error!())?;

        if end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(end)
    }

    /// Advance the cursor to the next multiple of `alignment`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the padding crosses the end of the data,
    /// or a malformed error for an alignment of zero.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        if alignment == 0 {
            return Err(malformed_error!("Alignment must not be zero"));
        }

        let padding = (alignment - (self.position % alignment)) % alignment;
        self.advance_by(padding)
    }

    /// Read a little-endian value and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if not enough data remains.
    pub fn read_le<T: ByteIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read a big-endian value and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if not enough data remains.
    pub fn read_be<T: ByteIO>(&mut self) -> Result<T> {
        read_be_at::<T>(self.data, &mut self.position)
    }

    /// Borrow the next `length` bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Borrow everything from the cursor to the end of the data, without advancing.
    #[must_use]
    pub fn slice_remaining(&self) -> &'a [u8] {
        self.data.get(self.position..).unwrap_or_default()
    }

    /// Read a NUL-terminated 8-bit string.
    ///
    /// Quarantine records store these in whatever ANSI code page the product ran under, so
    /// invalid UTF-8 is replaced rather than rejected. A string that runs to the end of the
    /// data without a terminator is accepted; the cursor then stops at the end.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the cursor is already at the end of the data.
    pub fn read_cstring(&mut self) -> Result<String> {
        let rest = self.slice_remaining();
        if rest.is_empty() {
            return Err(out_of_bounds_error!());
        }

        let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        let value = String::from_utf8_lossy(&rest[..end]).into_owned();

        self.position += (end + 1).min(rest.len());
        Ok(value)
    }

    /// Read a NUL-terminated UTF-16LE string.
    ///
    /// The terminator is a zero code unit on a two-byte boundary relative to the cursor. Lone
    /// surrogates are replaced. A missing terminator is accepted if the data ends on a code unit
    /// boundary.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if no complete code unit is available.
    pub fn read_utf16z(&mut self) -> Result<String> {
        let mut units: Vec<u16> = Vec::new();

        loop {
            if self.remaining() < 2 {
                if units.is_empty() {
                    return Err(out_of_bounds_error!());
                }
                break;
            }

            let unit = self.read_le::<u16>()?;
            if unit == 0 {
                break;
            }
            units.push(unit);
        }

        Ok(U16Str::from_slice(&units).to_string_lossy())
    }
}
