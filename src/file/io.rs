//! Endian-aware, bounds-checked primitive reads.
//!
//! Every multi-byte value a decoder takes from a quarantine container is read through
//! the functions in this module (directly, or through [`crate::file::parser::Parser`]).
//! A read that would cross the end of the buffer returns [`crate::Error::OutOfBounds`]
//! instead of panicking or returning garbage, and offset arithmetic is checked so that
//! attacker-chosen values close to `usize::MAX` cannot wrap around.
//!
//! # Key Components
//!
//! - [`crate::file::io::ByteIO`] - Trait implemented by every primitive that can be decoded
//! - [`crate::file::io::read_le`] / [`crate::file::io::read_be`] - Read from the start of a buffer
//! - [`crate::file::io::read_le_at`] / [`crate::file::io::read_be_at`] - Read at an offset and advance it
//!
//! # Usage Examples
//!
//! ```rust
//! use dexray::file::io::{read_le_at, read_be};
//!
//! let data = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00];
//! let mut offset = 0;
//!
//! let first: u16 = read_le_at(&data, &mut offset)?;
//! let second: u32 = read_le_at(&data, &mut offset)?;
//! assert_eq!((first, second, offset), (1, 2, 6));
//!
//! let value: u16 = read_be(&[0x12, 0x34])?;
//! assert_eq!(value, 0x1234);
//! # Ok::<(), dexray::Error>(())
//! ```

use crate::{Error::OutOfBounds, Result};

/// Trait for primitives that can be decoded from raw bytes in either byte order.
///
/// `Bytes` is the fixed-size array matching the in-memory width of the type; the
/// conversion from a slice fails (and is reported as [`crate::Error::OutOfBounds`]) if
/// the slice has the wrong length.
pub trait ByteIO: Sized {
    /// Fixed-size byte representation of the type
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Decode from little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Decode from big-endian bytes
    fn from_be_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_byte_io {
    ($($ty:ty),*) => {
        $(
            impl ByteIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn from_be_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_be_bytes(bytes)
                }
            }
        )*
    };
}

impl_byte_io!(u8, i8, u16, i16, u32, i32, u64, i64);

/// Reads a value from the start of `data` in little-endian byte order.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than `T`.
pub fn read_le<T: ByteIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Reads a value at `offset` in little-endian byte order and advances `offset` past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain
/// at `offset`. `offset` is left untouched on error.
pub fn read_le_at<T: ByteIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let bytes = field_at::<T>(data, *offset)?;
    *offset += std::mem::size_of::<T>();

    Ok(T::from_le_bytes(bytes))
}

/// Reads a value from the start of `data` in big-endian byte order.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than `T`.
pub fn read_be<T: ByteIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_be_at(data, &mut offset)
}

/// Reads a value at `offset` in big-endian byte order and advances `offset` past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain
/// at `offset`. `offset` is left untouched on error.
pub fn read_be_at<T: ByteIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let bytes = field_at::<T>(data, *offset)?;
    *offset += std::mem::size_of::<T>();

    Ok(T::from_be_bytes(bytes))
}

fn field_at<T: ByteIO>(data: &[u8], offset: usize) -> Result<T::Bytes> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };

    let Some(slice) = data.get(offset..end) else {
        return Err(OutOfBounds);
    };

    slice.try_into().map_err(|_| OutOfBounds)
}
