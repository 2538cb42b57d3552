//! Cipher Feedback (full block)
//!
//! `C_i = P_i ^ E(C_{i-1})`, `C_0 = IV`. Byte granular, the feedback register is filled with
//! ciphertext as it is produced or consumed.

use zeroize::Zeroize;
use crate::buf::{Block, MAX_BLOCK_SIZE};
use crate::cipher::Cipher;
use crate::error::Error;
use super::{load_iv, stage};

/// CFB feedback state.
pub struct Cfb {
    prev: Block,
    keystream: Block,
    pos: usize
}

opaque_dbg! { Cfb }

impl Cfb {
    /// Loads the feedback register with `iv`.
    ///
    /// # Errors
    ///
    /// `InvalidContext` if `iv` is not one block of `cipher`.
    pub fn new(cipher: &Cipher, iv: &[u8]) -> Result<Self, Error> {
        Ok(Self { prev: load_iv(cipher, iv)?, keystream: [0u8; MAX_BLOCK_SIZE], pos: 0 })
    }

    #[inline(always)]
    fn refill(&mut self, cipher: &Cipher) {
        if self.pos == 0 {
            self.keystream = self.prev;
            cipher.encrypt_scratch(&mut self.keystream);
        }
    }

    /// Encrypts `data` in place.
    pub fn encrypt_in_place(&mut self, cipher: &Cipher, data: &mut [u8]) {
        let bs = cipher.block_size();

        for byte in data {
            self.refill(cipher);
            *byte ^= self.keystream[self.pos];
            self.prev[self.pos] = *byte;
            self.pos = (self.pos + 1) % bs;
        }
    }

    /// Decrypts `data` in place.
    pub fn decrypt_in_place(&mut self, cipher: &Cipher, data: &mut [u8]) {
        let bs = cipher.block_size();

        for byte in data {
            self.refill(cipher);
            self.prev[self.pos] = *byte;
            *byte ^= self.keystream[self.pos];
            self.pos = (self.pos + 1) % bs;
        }
    }

    /// Encrypts `input` into the front of `output`.
    ///
    /// # Errors
    ///
    /// If `output` is shorter than `input`.
    pub fn encrypt(&mut self, cipher: &Cipher, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
        self.encrypt_in_place(cipher, stage(input, output)?);
        Ok(())
    }

    /// Decrypts `input` into the front of `output`.
    ///
    /// # Errors
    ///
    /// If `output` is shorter than `input`.
    pub fn decrypt(&mut self, cipher: &Cipher, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
        self.decrypt_in_place(cipher, stage(input, output)?);
        Ok(())
    }
}

impl Zeroize for Cfb {
    #[inline]
    fn zeroize(&mut self) {
        self.prev.zeroize();
        self.keystream.zeroize();
        self.pos = 0;
    }
}

impl Drop for Cfb {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}
