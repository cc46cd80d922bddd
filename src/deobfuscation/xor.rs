//! XOR transforms.
//!
//! Most quarantine formats disarm the stored file with nothing more than an XOR: a constant
//! byte (TrendMicro, McAfee) or a short repeating key (AhnLab). XOR is its own inverse, so
//! the same functions obfuscate and deobfuscate.

/// XOR every byte of `data` with `key`, in place.
///
/// ```rust
/// use dexray::deobfuscation::xor::xor_byte;
///
/// let mut data = *b"MZ";
/// xor_byte(&mut data, 0xFF);
/// assert_eq!(data, [0xB2, 0xA5]);
/// ```
pub fn xor_byte(data: &mut [u8], key: u8) {
    for byte in data.iter_mut() {
        *byte ^= key;
    }
}

/// XOR `data` with `key` repeated from its first byte, in place.
///
/// The schedule always starts at `key[0]` for `data[0]`; callers that decode several regions
/// with a fresh schedule each call this once per region. An empty key leaves the data as is.
///
/// ```rust
/// use dexray::deobfuscation::xor::xor_key;
///
/// let mut data = [0x00, 0x00, 0x00];
/// xor_key(&mut data, &[0x01, 0x02]);
/// assert_eq!(data, [0x01, 0x02, 0x01]);
/// ```
pub fn xor_key(data: &mut [u8], key: &[u8]) {
    if key.is_empty() {
        return;
    }

    for (byte, k) in data.iter_mut().zip(key.iter().cycle()) {
        *byte ^= k;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_byte_restores_plaintext() {
        let plain = *b"0123456789";
        let mut data: Vec<u8> = plain.iter().map(|b| b ^ 0x5A).collect();
        assert_ne!(data.as_slice(), plain.as_slice());

        xor_byte(&mut data, 0x5A);
        assert_eq!(data.as_slice(), plain.as_slice());
    }

    #[test]
    fn repeating_key_wraps() {
        let key = b"v3backup!@#$%^&)";
        let mut data = vec![0u8; 40];
        xor_key(&mut data, key);

        assert_eq!(&data[..16], key);
        assert_eq!(&data[16..32], key);
        assert_eq!(&data[32..], &key[..8]);
    }

    #[test]
    fn empty_inputs() {
        let mut data: [u8; 0] = [];
        xor_byte(&mut data, 0x6A);
        xor_key(&mut data, b"key");

        let mut data = [1, 2, 3];
        xor_key(&mut data, &[]);
        assert_eq!(data, [1, 2, 3]);
    }
}
