//! Defender `ResourceData` files.
//!
//! The file is a single RC4 region. Once decrypted:
//!
//! ```text
//! 0x00          header
//! 0x08          u32 LE    security descriptor length S
//! 0x14          S bytes   self-relative security descriptor of the original file
//! S + 0x1C      u64 LE    payload length
//! 0x28 + S      payload
//! ```
//!
//! The security descriptor doubles as the signature: it always starts with revision 1 and has
//! the `SE_SELF_RELATIVE` control bit set. Anything after the payload (alternate data stream
//! records) is ignored.

use crate::{
    deobfuscation::Rc4,
    file::{io::read_le_at, parser::Parser},
    quarantine::{Payload, Recovered},
    Result,
};

use super::{decrypt, KEY};

const DESCRIPTOR_LENGTH_OFFSET: usize = 0x08;
const DESCRIPTOR_OFFSET: usize = 0x14;
const HEADER_BASE: usize = 0x28;
const PAYLOAD_LENGTH_BASE: usize = 0x1C;

const SD_REVISION: u8 = 1;
const SE_SELF_RELATIVE: u16 = 0x8000;

/// Returns true if the decrypted start of `data` carries a self-relative security descriptor.
#[must_use]
pub fn is_resource(data: &[u8]) -> bool {
    let Some(stored) = data.get(..DESCRIPTOR_OFFSET + 4) else {
        return false;
    };

    let mut head = [0u8; DESCRIPTOR_OFFSET + 4];
    head.copy_from_slice(stored);
    Rc4::new(&KEY).apply(&mut head);

    let mut offset = DESCRIPTOR_OFFSET + 2;
    let control = read_le_at::<u16>(&head, &mut offset).unwrap_or(0);

    head[DESCRIPTOR_OFFSET] == SD_REVISION
        && head[DESCRIPTOR_OFFSET + 1] == 0
        && control & SE_SELF_RELATIVE != 0
}

/// Decode a `ResourceData` file.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the descriptor or payload length exceeds the file.
pub fn parse(data: &[u8]) -> Result<Option<Recovered>> {
    if !is_resource(data) {
        return Ok(None);
    }

    let decrypted = decrypt(data);

    let mut offset = DESCRIPTOR_LENGTH_OFFSET;
    let descriptor_len = read_le_at::<u32>(&decrypted, &mut offset)? as usize;

    let Some(header_len) = HEADER_BASE.checked_add(descriptor_len) else {
        return Err(malformed_error!("Invalid descriptor length {}", descriptor_len));
    };
    if header_len > decrypted.len() {
        return Err(malformed_error!(
            "Resource header of {} bytes exceeds the file ({} bytes)",
            header_len,
            decrypted.len()
        ));
    }

    let mut offset = descriptor_len + PAYLOAD_LENGTH_BASE;
    let payload_len = read_le_at::<u64>(&decrypted, &mut offset)?;

    let mut parser = Parser::new(&decrypted);
    parser.seek(header_len)?;
    let payload_len = usize::try_from(payload_len).unwrap_or(usize::MAX);
    if payload_len > parser.remaining() {
        return Err(malformed_error!(
            "Resource payload of {} bytes exceeds the {} bytes left",
            payload_len,
            parser.remaining()
        ));
    }

    let payload = parser.read_bytes(payload_len)?.to_vec();
    Ok(Some(Recovered {
        payloads: vec![Payload::new(payload, None)],
        ..Recovered::default()
    }))
}
