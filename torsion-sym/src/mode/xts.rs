//! XEX-based Tweaked Codebook with Ciphertext Stealing (IEEE 1619)
//!
//! Two keys: the data key drives the borrowed [`Cipher`], the tweak key is only needed at
//! [`Xts::setup`] to encrypt the IV into the first tweak. Each block advances the tweak by a
//! multiplication with `α` in GF(2^128).

use zeroize::Zeroize;
use crate::buf::{Block, MAX_BLOCK_SIZE, xor_in_place};
use crate::cipher::Cipher;
use crate::error::Error;
use super::{ecb::check_steal, ensure_aligned, stage};

/// XTS requires a 128-bit block cipher.
pub const BLOCK_SIZE: usize = 16;

/// XTS tweak state.
pub struct Xts {
    tweak: Block,
    ready: bool
}

opaque_dbg! { Xts }

// multiplication by α, little-endian with the 0x87 reduction.
#[inline(always)]
fn mul_alpha(t: &mut Block) {
    let carry = t[15] >> 7;

    for i in (1..16).rev() {
        t[i] = (t[i] << 1) | (t[i - 1] >> 7);
    }

    t[0] = (t[0] << 1) ^ (0x87 & carry.wrapping_neg());
}

impl Xts {
    /// Stores the sector IV, [`setup`](Self::setup) must follow before any data.
    ///
    /// # Errors
    ///
    /// `InvalidContext` if `cipher` does not have a 16 byte block or `iv` is not 16 bytes.
    pub fn new(cipher: &Cipher, iv: &[u8]) -> Result<Self, Error> {
        ensure!(
            cipher.block_size() == BLOCK_SIZE,
            InvalidContext, cipher = cipher.kind().name(), "xts requires a 16 byte block"
        );
        ensure!(iv.len() == BLOCK_SIZE, InvalidContext, iv_len = iv.len(), "xts iv rejected");

        let mut tweak = [0u8; MAX_BLOCK_SIZE];
        tweak.copy_from_slice(iv);
        Ok(Self { tweak, ready: false })
    }

    /// Encrypts the IV under the tweak key `key2` to form the first tweak.
    ///
    /// # Errors
    ///
    /// `InvalidKeySize` if `key2` differs in length from the data key of `cipher`, and
    /// `InvalidState` if called twice.
    pub fn setup(&mut self, cipher: &Cipher, key2: &[u8]) -> Result<(), Error> {
        ensure!(!self.ready, InvalidState, "xts setup twice");
        ensure!(
            key2.len() == cipher.kind().key_size(),
            InvalidKeySize, key_len = key2.len(), "xts tweak key rejected"
        );

        let tweak_cipher = Cipher::new(cipher.kind(), key2)?;
        tweak_cipher.encrypt_scratch(&mut self.tweak);
        self.ready = true;

        Ok(())
    }

    #[inline]
    fn ensure_ready(&self) -> Result<(), Error> {
        ensure!(self.ready, InvalidState, "xts used before setup");
        Ok(())
    }

    #[inline(always)]
    fn crypt_block(cipher: &Cipher, tweak: &Block, block: &mut [u8], encrypt: bool) {
        xor_in_place(block, tweak);

        if encrypt {
            cipher.encrypt_unchecked(block);
        } else {
            cipher.decrypt_unchecked(block);
        }

        xor_in_place(block, tweak);
    }

    /// Encrypts whole blocks in place.
    ///
    /// # Errors
    ///
    /// If `data` is not a multiple of 16 or the state was not set up.
    pub fn encrypt_in_place(&mut self, cipher: &Cipher, data: &mut [u8]) -> Result<(), Error> {
        self.ensure_ready()?;
        ensure_aligned(data.len(), BLOCK_SIZE)?;

        for block in data.chunks_exact_mut(BLOCK_SIZE) {
            Self::crypt_block(cipher, &self.tweak, block, true);
            mul_alpha(&mut self.tweak);
        }

        Ok(())
    }

    /// Decrypts whole blocks in place.
    ///
    /// # Errors
    ///
    /// If `data` is not a multiple of 16 or the state was not set up.
    pub fn decrypt_in_place(&mut self, cipher: &Cipher, data: &mut [u8]) -> Result<(), Error> {
        self.ensure_ready()?;
        ensure_aligned(data.len(), BLOCK_SIZE)?;

        for block in data.chunks_exact_mut(BLOCK_SIZE) {
            Self::crypt_block(cipher, &self.tweak, block, false);
            mul_alpha(&mut self.tweak);
        }

        Ok(())
    }

    /// Encrypts `input` into the front of `output`.
    ///
    /// # Errors
    ///
    /// If `input` is unaligned, `output` is too short, or the state was not set up.
    pub fn encrypt(&mut self, cipher: &Cipher, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
        ensure_aligned(input.len(), BLOCK_SIZE)?;
        self.encrypt_in_place(cipher, stage(input, output)?)
    }

    /// Decrypts `input` into the front of `output`.
    ///
    /// # Errors
    ///
    /// If `input` is unaligned, `output` is too short, or the state was not set up.
    pub fn decrypt(&mut self, cipher: &Cipher, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
        ensure_aligned(input.len(), BLOCK_SIZE)?;
        self.decrypt_in_place(cipher, stage(input, output)?)
    }

    /// Ciphertext stealing for the final partial block.
    ///
    /// `last` is the most recent ciphertext block, `partial` the final plaintext bytes. On
    /// return `last` holds the full output block and `partial` the truncated one.
    ///
    /// # Errors
    ///
    /// If the lengths are wrong or the state was not set up.
    pub fn steal(&mut self, cipher: &Cipher, last: &mut [u8], partial: &mut [u8]) -> Result<(), Error> {
        self.ensure_ready()?;
        check_steal(cipher, last, partial)?;

        let d = partial.len();
        last[..d].swap_with_slice(partial);
        Self::crypt_block(cipher, &self.tweak, last, true);

        Ok(())
    }

    /// Reverses [`steal`](Self::steal).
    ///
    /// `last` is the full ciphertext block, `partial` the truncated one, and the tweak is the
    /// one of the block before them.
    ///
    /// # Errors
    ///
    /// If the lengths are wrong or the state was not set up.
    pub fn unsteal(&mut self, cipher: &Cipher, last: &mut [u8], partial: &mut [u8]) -> Result<(), Error> {
        self.ensure_ready()?;
        check_steal(cipher, last, partial)?;

        let d = partial.len();
        let mut next = self.tweak;
        mul_alpha(&mut next);

        Self::crypt_block(cipher, &next, last, false);
        last[..d].swap_with_slice(partial);
        Self::crypt_block(cipher, &self.tweak, last, false);

        next.zeroize();
        Ok(())
    }
}

impl Zeroize for Xts {
    #[inline]
    fn zeroize(&mut self) {
        self.tweak.zeroize();
        self.ready = false;
    }
}

impl Drop for Xts {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}
