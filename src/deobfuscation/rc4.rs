//! RC4 keystream.
//!
//! Windows Defender and the Avast/AVG chest encrypt quarantined data with RC4 under a key that
//! is a constant of the product. RC4 here is nothing more than a key-schedule-derived XOR
//! stream: [`Rc4::apply`] XORs the next keystream bytes into a buffer, so encryption and
//! decryption are the same operation.
//!
//! A cipher instance is stateful. Decoding the first few bytes for a signature check and then
//! the rest of the data with the *same* instance yields the same result as decoding everything
//! at once, which lets decoders reject non-matching files after generating only a handful of
//! keystream bytes.

/// RC4 cipher state.
#[derive(Clone)]
pub struct Rc4 {
    state: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    /// Runs the key-scheduling algorithm for `key`.
    ///
    /// An empty key is treated as a single zero byte.
    #[must_use]
    pub fn new(key: &[u8]) -> Self {
        let key: &[u8] = if key.is_empty() { &[0] } else { key };

        let mut state = [0u8; 256];
        for (index, slot) in state.iter_mut().enumerate() {
            // index < 256
            *slot = index as u8;
        }

        let mut j = 0u8;
        for i in 0..256 {
            j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
            state.swap(i, usize::from(j));
        }

        Rc4 { state, i: 0, j: 0 }
    }

    /// XORs the next `data.len()` keystream bytes into `data`.
    pub fn apply(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            *byte ^= self.next_byte();
        }
    }

    fn next_byte(&mut self) -> u8 {
        self.i = self.i.wrapping_add(1);
        self.j = self.j.wrapping_add(self.state[usize::from(self.i)]);
        self.state.swap(usize::from(self.i), usize::from(self.j));

        let index = self.state[usize::from(self.i)].wrapping_add(self.state[usize::from(self.j)]);
        self.state[usize::from(index)]
    }
}

impl std::fmt::Debug for Rc4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rc4").finish_non_exhaustive()
    }
}
