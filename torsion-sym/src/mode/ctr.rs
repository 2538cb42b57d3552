//! Counter Mode
//!
//! The whole block is a big-endian counter (128-bit for 16 byte ciphers, 64-bit for 8 byte
//! ones), `keystream_i = E(counter + i)`. Encryption and decryption are the same operation.

use zeroize::Zeroize;
use crate::buf::Block;
use crate::cipher::Cipher;
use crate::error::Error;
use super::{increment_be, load_iv, stage};

/// CTR keystream state.
pub struct Ctr {
    counter: Block,
    keystream: Block,
    pos: usize
}

opaque_dbg! { Ctr }

impl Ctr {
    /// Starts the counter at `iv`.
    ///
    /// # Errors
    ///
    /// `InvalidContext` if `iv` is not one block of `cipher`.
    pub fn new(cipher: &Cipher, iv: &[u8]) -> Result<Self, Error> {
        Ok(Self::from_block(load_iv(cipher, iv)?))
    }

    /// Starts the counter at a block computed elsewhere (the EAX nonce MAC).
    #[inline]
    pub(crate) const fn from_block(counter: Block) -> Self {
        Self { counter, keystream: [0u8; crate::buf::MAX_BLOCK_SIZE], pos: 0 }
    }

    /// XORs the keystream into `data`.
    pub fn apply_keystream(&mut self, cipher: &Cipher, data: &mut [u8]) {
        let bs = cipher.block_size();

        for byte in data {
            if self.pos == 0 {
                self.keystream = self.counter;
                cipher.encrypt_scratch(&mut self.keystream);
                increment_be(&mut self.counter[..bs]);
            }

            *byte ^= self.keystream[self.pos];
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

impl Zeroize for Ctr {
    #[inline]
    fn zeroize(&mut self) {
        self.counter.zeroize();
        self.keystream.zeroize();
        self.pos = 0;
    }
}

impl Drop for Ctr {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}
