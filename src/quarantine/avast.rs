//! Avast and AVG virus chest files.
//!
//! The chest stores each quarantined file RC4-encrypted as a whole under a fixed 128-byte key.
//! The decrypted data starts with the 8-byte marker `-chest- `, followed by the original
//! file content. The chest file itself records no metadata; names and detection details live
//! in the product's separate chest database.

use crate::{
    deobfuscation::Rc4,
    quarantine::{Metadata, Payload, Recovered},
    Result,
};

/// Marker at the start of every decrypted chest file.
pub const MARKER: &[u8; 8] = b"-chest- ";

/// RC4 key of the virus chest.
pub const KEY: [u8; 128] = [
    0x33, 0xB6, 0x59, 0x83, 0x3A, 0x2A, 0x33, 0x86, 0x8D, 0x3C, 0xB3, 0x73, 0x7E, 0x38, 0x3D, 0x15,
    0x8E, 0x75, 0x28, 0x39, 0xD1, 0xCA, 0x5F, 0xF4, 0x9C, 0x61, 0x82, 0x64, 0x35, 0x9B, 0x4E, 0x44,
    0x09, 0x64, 0xA4, 0xFB, 0x22, 0x55, 0x87, 0xB0, 0x28, 0xC6, 0x3A, 0x92, 0xCE, 0x1D, 0xCC, 0xC9,
    0xE6, 0xD7, 0x5D, 0xF3, 0x6C, 0xFF, 0x96, 0x53, 0x90, 0xBB, 0xA3, 0x2C, 0x79, 0x30, 0x9F, 0x68,
    0x47, 0xF5, 0xBE, 0x5E, 0x3B, 0x63, 0x59, 0x8A, 0x02, 0x0B, 0x80, 0xC6, 0x75, 0x56, 0x72, 0xD5,
    0x0A, 0xF1, 0x18, 0x50, 0x49, 0x1B, 0x46, 0x14, 0x8F, 0xC4, 0x4E, 0x20, 0x12, 0xB8, 0x2D, 0x22,
    0xC5, 0x28, 0xF7, 0x3F, 0x39, 0xB5, 0x3A, 0x2F, 0x44, 0xB2, 0x8A, 0x2D, 0x12, 0x74, 0x80, 0x6E,
    0xFE, 0x74, 0xBF, 0x66, 0xE7, 0x92, 0x34, 0x27, 0x90, 0xBE, 0xEA, 0x86, 0x26, 0xDB, 0x58, 0xCC,
];

/// Decode a chest file.
///
/// Only the first eight bytes are decrypted to check the marker, so a non-matching file costs
/// one key schedule and no copy.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the marker matches but nothing follows it.
pub fn parse(data: &[u8]) -> Result<Option<Recovered>> {
    let Some(stored_marker) = data.get(..MARKER.len()) else {
        return Ok(None);
    };

    let mut cipher = Rc4::new(&KEY);
    let mut marker = [0u8; MARKER.len()];
    marker.copy_from_slice(stored_marker);
    cipher.apply(&mut marker);

    if &marker != MARKER {
        return Ok(None);
    }

    let stored = data.get(MARKER.len()..).unwrap_or_default();
    if stored.is_empty() {
        return Err(malformed_error!("Chest file holds no data after the marker"));
    }

    // Same cipher instance: the payload continues the keystream after the marker
    let mut payload = stored.to_vec();
    cipher.apply(&mut payload);

    Ok(Some(Recovered {
        payloads: vec![Payload::new(payload, None)],
        metadata: Metadata::new(),
    }))
}
