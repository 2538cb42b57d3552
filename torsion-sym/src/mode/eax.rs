//! EAX Authenticated Encryption
//!
//! `N = OMAC^0(iv)`, `H = OMAC^1(aad)`, `C = OMAC^2(ciphertext)`, the text is CTR encrypted
//! from `N` and the tag is `N ^ H ^ C`. The three MACs are independent, so associated data may
//! be supplied at any point before the digest.

use zeroize::Zeroize;
use crate::buf::{Block, xor_in_place};
use crate::cipher::Cipher;
use crate::error::Error;
use super::cmac::Cmac;
use super::ctr::Ctr;
use super::stage;

/// EAX state.
pub struct Eax {
    nonce_mac: Block,
    header: Cmac,
    text: Cmac,
    ctr: Ctr
}

opaque_dbg! { Eax }

impl Eax {
    /// Computes the nonce MAC and starts the counter from it.
    ///
    /// Any nonce length, including empty, is accepted.
    pub fn new(cipher: &Cipher, iv: &[u8]) -> Self {
        let mut n = Cmac::with_prefix(cipher, 0);
        n.update(cipher, iv);
        let nonce_mac = n.finish(cipher);

        Self {
            nonce_mac,
            header: Cmac::with_prefix(cipher, 1),
            text: Cmac::with_prefix(cipher, 2),
            ctr: Ctr::from_block(nonce_mac)
        }
    }

    /// Authenticates associated data.
    pub fn aad(&mut self, cipher: &Cipher, aad: &[u8]) {
        self.header.update(cipher, aad);
    }

    /// Encrypts `data` in place.
    pub fn encrypt_in_place(&mut self, cipher: &Cipher, data: &mut [u8]) {
        self.ctr.apply_keystream(cipher, data);
        self.text.update(cipher, data);
    }

    /// Decrypts `data` in place.
    pub fn decrypt_in_place(&mut self, cipher: &Cipher, data: &mut [u8]) {
        self.text.update(cipher, data);
        self.ctr.apply_keystream(cipher, data);
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

    /// Computes the tag, one block of `cipher`, into the front of the returned block.
    pub fn digest(&mut self, cipher: &Cipher) -> Block {
        let bs = cipher.block_size();

        let mut tag = self.nonce_mac;
        xor_in_place(&mut tag[..bs], &self.header.finish(cipher)[..bs]);
        xor_in_place(&mut tag[..bs], &self.text.finish(cipher)[..bs]);
        tag
    }
}

impl Zeroize for Eax {
    #[inline]
    fn zeroize(&mut self) {
        self.nonce_mac.zeroize();
        self.header.zeroize();
        self.text.zeroize();
        self.ctr.zeroize();
    }
}

impl Drop for Eax {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}
