//! Galois/Counter Mode (NIST SP 800-38D)
//!
//! Associated data must be supplied before the first byte of text, after which GHASH moves on
//! to the ciphertext segment. [`Gcm::digest`] may be called once all text has been processed.

use zeroize::Zeroize;
use crate::buf::{Block, MAX_BLOCK_SIZE};
use crate::cipher::Cipher;
use crate::error::Error;
use super::ghash::Ghash;
use super::stage;

/// The GCM tag size.
pub const TAG_SIZE: usize = 16;

/// The most text one invocation may process, `2^32 - 2` blocks.
pub const MAX_TEXT_LEN: u64 = ((1 << 32) - 2) * 16;

#[inline(always)]
fn inc32(block: &mut Block) {
    let ctr = u32::from_be_bytes([block[12], block[13], block[14], block[15]]).wrapping_add(1);
    block[12..16].copy_from_slice(&ctr.to_be_bytes());
}

/// GCM encryption / decryption state.
pub struct Gcm {
    ghash: Ghash,
    counter: Block,
    tag_mask: Block,
    keystream: Block,
    pos: usize,
    aad_len: u64,
    ct_len: u64,
    text_started: bool
}

opaque_dbg! { Gcm }

impl Gcm {
    /// Derives the hash key and the pre-counter block from `iv`.
    ///
    /// A 12 byte IV is used directly, any other length is compressed through GHASH.
    ///
    /// # Errors
    ///
    /// `InvalidContext` if `cipher` does not have a 16 byte block or `iv` is empty.
    pub fn new(cipher: &Cipher, iv: &[u8]) -> Result<Self, Error> {
        ensure!(
            cipher.block_size() == 16,
            InvalidContext, cipher = cipher.kind().name(), "gcm requires a 16 byte block"
        );
        ensure!(!iv.is_empty(), InvalidContext, "gcm iv empty");

        let mut h = [0u8; MAX_BLOCK_SIZE];
        cipher.encrypt_scratch(&mut h);

        let mut j0 = [0u8; MAX_BLOCK_SIZE];

        if iv.len() == 12 {
            j0[..12].copy_from_slice(iv);
            j0[15] = 1;
        } else {
            let mut iv_hash = Ghash::new(h);
            iv_hash.update(iv);
            j0 = iv_hash.finish(0, iv.len() as u64);
        }

        let mut tag_mask = j0;
        cipher.encrypt_scratch(&mut tag_mask);

        let mut counter = j0;
        inc32(&mut counter);

        let gcm = Self {
            ghash: Ghash::new(h),
            counter,
            tag_mask,
            keystream: [0u8; MAX_BLOCK_SIZE],
            pos: 0,
            aad_len: 0,
            ct_len: 0,
            text_started: false
        };

        h.zeroize();
        j0.zeroize();

        Ok(gcm)
    }

    /// Authenticates associated data.
    ///
    /// # Errors
    ///
    /// `InvalidState` once encryption or decryption has started.
    pub fn aad(&mut self, aad: &[u8]) -> Result<(), Error> {
        ensure!(!self.text_started, InvalidState, "gcm aad after text");

        self.ghash.update(aad);
        self.aad_len = self.aad_len.wrapping_add(aad.len() as u64);
        Ok(())
    }

    #[inline]
    fn start_text(&mut self) {
        if !self.text_started {
            self.ghash.pad();
            self.text_started = true;
        }
    }

    fn apply_keystream(&mut self, cipher: &Cipher, data: &mut [u8]) {
        for byte in data {
            if self.pos == 0 {
                self.keystream = self.counter;
                cipher.encrypt_scratch(&mut self.keystream);
                inc32(&mut self.counter);
            }

            *byte ^= self.keystream[self.pos];
            self.pos = (self.pos + 1) % 16;
        }
    }

    #[inline]
    fn check_text_len(&self, len: usize) -> Result<(), Error> {
        ensure!(
            (len as u64) <= MAX_TEXT_LEN - self.ct_len,
            InvalidLength, processed = self.ct_len, len, "gcm text limit exceeded"
        );
        Ok(())
    }

    /// Encrypts `data` in place.
    ///
    /// # Errors
    ///
    /// `InvalidLength` if the total text would exceed [`MAX_TEXT_LEN`], nothing is processed.
    pub fn encrypt_in_place(&mut self, cipher: &Cipher, data: &mut [u8]) -> Result<(), Error> {
        self.check_text_len(data.len())?;
        self.start_text();
        self.apply_keystream(cipher, data);
        self.ghash.update(data);
        self.ct_len += data.len() as u64;
        Ok(())
    }

    /// Decrypts `data` in place.
    ///
    /// # Errors
    ///
    /// `InvalidLength` if the total text would exceed [`MAX_TEXT_LEN`], nothing is processed.
    pub fn decrypt_in_place(&mut self, cipher: &Cipher, data: &mut [u8]) -> Result<(), Error> {
        self.check_text_len(data.len())?;
        self.start_text();
        self.ghash.update(data);
        self.apply_keystream(cipher, data);
        self.ct_len += data.len() as u64;
        Ok(())
    }

    /// Encrypts `input` into the front of `output`.
    ///
    /// # Errors
    ///
    /// If `output` is shorter than `input`, or see [`encrypt_in_place`](Self::encrypt_in_place).
    pub fn encrypt(&mut self, cipher: &Cipher, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
        self.encrypt_in_place(cipher, stage(input, output)?)
    }

    /// Decrypts `input` into the front of `output`.
    ///
    /// # Errors
    ///
    /// If `output` is shorter than `input`, or see [`decrypt_in_place`](Self::decrypt_in_place).
    pub fn decrypt(&mut self, cipher: &Cipher, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
        self.decrypt_in_place(cipher, stage(input, output)?)
    }

    /// Computes the full 16 byte tag.
    pub fn digest(&mut self) -> [u8; TAG_SIZE] {
        let mut s = self.ghash.finish(self.aad_len, self.ct_len);

        for (t, m) in s.iter_mut().zip(self.tag_mask.iter()) {
            *t ^= *m;
        }

        s
    }
}

impl Zeroize for Gcm {
    #[inline]
    fn zeroize(&mut self) {
        self.ghash.zeroize();
        self.counter.zeroize();
        self.tag_mask.zeroize();
        self.keystream.zeroize();
        self.pos = 0;
        self.aad_len = 0;
        self.ct_len = 0;
    }
}

impl Drop for Gcm {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::CipherKind;
    use hex_literal::hex;

    #[test]
    fn zero_key_empty_text() {
        let cipher = Cipher::new(CipherKind::Aes128, &[0; 16]).unwrap();
        let mut gcm = Gcm::new(&cipher, &[0; 12]).unwrap();
        assert_eq!(gcm.digest(), hex!("58e2fccefa7e3061367f1d57a4e7455a"));
    }

    #[test]
    fn zero_key_one_block() {
        let cipher = Cipher::new(CipherKind::Aes128, &[0; 16]).unwrap();
        let mut gcm = Gcm::new(&cipher, &[0; 12]).unwrap();

        let mut data = [0u8; 16];
        gcm.encrypt_in_place(&cipher, &mut data).unwrap();

        assert_eq!(data, hex!("0388dace60b6a392f328c2b971b2fe78"));
        assert_eq!(gcm.digest(), hex!("ab6e47d42cec13bdf53a67b21257bddf"));
    }

    #[test]
    fn rejects_bad_setup() {
        let aes = Cipher::new(CipherKind::Aes128, &[0; 16]).unwrap();
        assert!(Gcm::new(&aes, &[]).is_err());

        let des = Cipher::new(CipherKind::Des, &[1; 8]).unwrap();
        assert!(Gcm::new(&des, &[0; 12]).is_err());
    }

    #[test]
    fn aad_after_text() {
        let cipher = Cipher::new(CipherKind::Aes128, &[0; 16]).unwrap();
        let mut gcm = Gcm::new(&cipher, &[0; 12]).unwrap();

        gcm.aad(b"header").unwrap();
        gcm.encrypt_in_place(&cipher, &mut [0u8; 3]).unwrap();
        assert_eq!(gcm.aad(b"late").unwrap_err().kind(), crate::ErrorKind::InvalidState);
    }

    #[test]
    fn text_limit() {
        let cipher = Cipher::new(CipherKind::Aes128, &[0; 16]).unwrap();
        let mut gcm = Gcm::new(&cipher, &[0; 12]).unwrap();
        gcm.ct_len = MAX_TEXT_LEN - 3;

        gcm.encrypt_in_place(&cipher, &mut [0u8; 3]).unwrap();

        let mut data = [7u8; 1];
        assert_eq!(
            gcm.encrypt_in_place(&cipher, &mut data).unwrap_err().kind(),
            crate::ErrorKind::InvalidLength
        );
        assert_eq!(data, [7u8; 1]);
        assert_eq!(gcm.ct_len, MAX_TEXT_LEN);
        assert!(gcm.decrypt_in_place(&cipher, &mut data).is_err());
    }
}
