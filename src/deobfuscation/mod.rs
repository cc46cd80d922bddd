//! Deobfuscation primitives for quarantine containers.
//!
//! Antivirus products do not encrypt quarantined files to protect them, they disarm them so the
//! stored copy is not picked up by other scanners or executed by accident. The transforms are
//! therefore simple and keyed with product constants:
//!
//! | Vendor      | Transform                              |
//! |-------------|----------------------------------------|
//! | AhnLab      | repeating XOR, 16-byte key             |
//! | Avast/AVG   | RC4, 128-byte key                      |
//! | McAfee BUP  | single-byte XOR `0x6A` per stream      |
//! | Defender    | RC4, 256-byte key, per region          |
//! | TrendMicro  | single-byte XOR `0xFF`                 |
//!
//! All transforms are length-preserving and self-inverse. The key material lives next to the
//! decoder that needs it; this module only knows how to apply it.
//!
//! # Usage Examples
//!
//! ```rust
//! use dexray::deobfuscation::Transform;
//!
//! let stored = Transform::Xor(0xFF).decode(b"MZ");
//! assert_eq!(Transform::Xor(0xFF).decode(&stored), b"MZ");
//! ```

pub mod rc4;
pub mod xor;

pub use rc4::Rc4;

/// A keyed, length-preserving byte transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform<'k> {
    /// XOR with a constant byte
    Xor(u8),
    /// XOR with a repeating key, restarting at the first key byte
    XorKey(&'k [u8]),
    /// RC4 keystream under a fixed key, starting at keystream offset zero
    Rc4(&'k [u8]),
}

impl Transform<'_> {
    /// Applies the transform to `data` in place.
    pub fn apply(&self, data: &mut [u8]) {
        match self {
            Transform::Xor(key) => xor::xor_byte(data, *key),
            Transform::XorKey(key) => xor::xor_key(data, key),
            Transform::Rc4(key) => Rc4::new(key).apply(data),
        }
    }

    /// Returns a transformed copy of `data`.
    #[must_use]
    pub fn decode(&self, data: &[u8]) -> Vec<u8> {
        let mut output = data.to_vec();
        self.apply(&mut output);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transforms_are_self_inverse() {
        let plain = b"This program cannot be run in DOS mode".to_vec();
        let transforms = [
            Transform::Xor(0x6A),
            Transform::XorKey(b"v3backup!@#$%^&)"),
            Transform::Rc4(b"Secret"),
        ];

        for transform in transforms {
            let stored = transform.decode(&plain);
            assert_eq!(stored.len(), plain.len());
            assert_ne!(stored, plain, "{transform:?} left data unchanged");
            assert_eq!(transform.decode(&stored), plain);
        }
    }

    #[test]
    fn apply_matches_decode() {
        let mut data = vec![0x11, 0x22, 0x33];
        let copy = Transform::XorKey(&[0x01, 0x02]).decode(&data);
        Transform::XorKey(&[0x01, 0x02]).apply(&mut data);
        assert_eq!(data, copy);
        assert_eq!(data, vec![0x10, 0x20, 0x32]);
    }
}
