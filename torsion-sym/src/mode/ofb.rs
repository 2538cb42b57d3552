//! Output Feedback
//!
//! `O_i = E(O_{i-1})`, `O_0 = IV`, the keystream is independent of the data.

use zeroize::Zeroize;
use crate::buf::Block;
use crate::cipher::Cipher;
use crate::error::Error;
use super::{load_iv, stage};

/// OFB keystream state.
pub struct Ofb {
    state: Block,
    pos: usize
}

opaque_dbg! { Ofb }

impl Ofb {
    /// Loads the feedback register with `iv`.
    ///
    /// # Errors
    ///
    /// `InvalidContext` if `iv` is not one block of `cipher`.
    pub fn new(cipher: &Cipher, iv: &[u8]) -> Result<Self, Error> {
        Ok(Self { state: load_iv(cipher, iv)?, pos: 0 })
    }

    /// XORs the keystream into `data`.
    pub fn apply_keystream(&mut self, cipher: &Cipher, data: &mut [u8]) {
        let bs = cipher.block_size();

        for byte in data {
            if self.pos == 0 {
                cipher.encrypt_scratch(&mut self.state);
            }

            *byte ^= self.state[self.pos];
            self.pos = (self.pos + 1) % bs;
        }
    }

    /// Writes `input ^ keystream` to the front of `output`.
    ///
    /// # Errors
    ///
    /// If `output` is shorter than `input`.
    pub fn crypt(&mut self, cipher: &Cipher, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
        self.apply_keystream(cipher, stage(input, output)?);
        Ok(())
    }
}

impl Zeroize for Ofb {
    #[inline]
    fn zeroize(&mut self) {
        self.state.zeroize();
        self.pos = 0;
    }
}

impl Drop for Ofb {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}
