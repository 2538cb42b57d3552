//! The RC4 Stream Cipher
//!
//! Legacy only. RC4 has no block size, so it lives beside the [`Cipher`](super::Cipher) dispatch
//! rather than inside it.

use zeroize::Zeroize;
use crate::error::Error;

/// The largest accepted RC4 key.
pub const MAX_KEY_SIZE: usize = 256;

/// An RC4 keystream generator.
///
/// The permutation and indices are zeroed on drop.
#[derive(Clone)]
pub struct Rc4 {
    s: [u8; 256],
    i: u8,
    j: u8
}

opaque_dbg! { Rc4 }

impl Rc4 {
    /// Runs the RC4 key schedule.
    ///
    /// # Errors
    ///
    /// If the key is empty or longer than 256 bytes.
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        ensure!(
            !key.is_empty() && key.len() <= MAX_KEY_SIZE,
            InvalidKeySize, key_len = key.len(), "rc4 key rejected"
        );

        let mut s = [0u8; 256];
        for (i, b) in s.iter_mut().enumerate() {
            *b = i as u8;
        }

        let mut j = 0u8;
        for i in 0..256 {
            j = j.wrapping_add(s[i]).wrapping_add(key[i % key.len()]);
            s.swap(i, j as usize);
        }

        Ok(Self { s, i: 0, j: 0 })
    }

    #[inline(always)]
    fn next_byte(&mut self) -> u8 {
        self.i = self.i.wrapping_add(1);
        self.j = self.j.wrapping_add(self.s[self.i as usize]);
        self.s.swap(self.i as usize, self.j as usize);

        let idx = self.s[self.i as usize].wrapping_add(self.s[self.j as usize]);
        self.s[idx as usize]
    }

    /// XORs the keystream into `data`.
    pub fn apply_keystream(&mut self, data: &mut [u8]) {
        for b in data {
            *b ^= self.next_byte();
        }
    }

    /// Writes `input ^ keystream` to `output`.
    ///
    /// # Errors
    ///
    /// If `output` is shorter than `input`.
    pub fn crypt(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
        ensure!(
            output.len() >= input.len(),
            InvalidLength, input = input.len(), output = output.len(), "rc4 output too small"
        );

        for (o, i) in output.iter_mut().zip(input.iter()) {
            *o = *i ^ self.next_byte();
        }

        Ok(())
    }
}

impl Zeroize for Rc4 {
    #[inline]
    fn zeroize(&mut self) {
        self.s.zeroize();
        self.i.zeroize();
        self.j.zeroize();
    }
}

impl Drop for Rc4 {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}
