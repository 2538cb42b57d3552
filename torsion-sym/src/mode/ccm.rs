//! Counter with CBC-MAC (NIST SP 800-38C, RFC 3610)
//!
//! The first authenticated block encodes the total message length, so CCM cannot start until
//! [`Ccm::setup`] has been given it along with the tag length and all associated data. The
//! number of bytes processed afterwards must match the declared length exactly.

use zeroize::Zeroize;
use crate::buf::{Block, MAX_BLOCK_SIZE};
use crate::cipher::Cipher;
use crate::error::Error;
use super::{increment_be, stage};

/// The shortest accepted CCM nonce.
pub const MIN_IV_SIZE: usize = 7;
/// The longest accepted CCM nonce.
pub const MAX_IV_SIZE: usize = 13;

/// Whether `len` is a valid CCM tag length.
#[inline]
pub const fn valid_tag_len(len: usize) -> bool {
    len >= 4 && len <= 16 && len % 2 == 0
}

/// CCM state.
pub struct Ccm {
    iv: [u8; MAX_IV_SIZE],
    iv_len: usize,
    mac: Block,
    mac_pos: usize,
    counter: Block,
    tag_mask: Block,
    keystream: Block,
    ks_pos: usize,
    msg_len: u64,
    processed: u64,
    tag_len: usize,
    ready: bool
}

opaque_dbg! { Ccm }

impl Ccm {
    /// Stores the nonce, [`setup`](Self::setup) must follow before any data.
    ///
    /// # Errors
    ///
    /// `InvalidContext` if `cipher` does not have a 16 byte block or `iv` is not 7 to 13 bytes.
    pub fn new(cipher: &Cipher, iv: &[u8]) -> Result<Self, Error> {
        ensure!(
            cipher.block_size() == 16,
            InvalidContext, cipher = cipher.kind().name(), "ccm requires a 16 byte block"
        );
        ensure!(
            (MIN_IV_SIZE..=MAX_IV_SIZE).contains(&iv.len()),
            InvalidContext, iv_len = iv.len(), "ccm iv rejected"
        );

        let mut stored = [0u8; MAX_IV_SIZE];
        stored[..iv.len()].copy_from_slice(iv);

        Ok(Self {
            iv: stored,
            iv_len: iv.len(),
            mac: [0u8; MAX_BLOCK_SIZE],
            mac_pos: 0,
            counter: [0u8; MAX_BLOCK_SIZE],
            tag_mask: [0u8; MAX_BLOCK_SIZE],
            keystream: [0u8; MAX_BLOCK_SIZE],
            ks_pos: 0,
            msg_len: 0,
            processed: 0,
            tag_len: 0,
            ready: false
        })
    }

    /// The size of the length field, `15 - iv_len`.
    #[inline]
    const fn l(&self) -> usize {
        15 - self.iv_len
    }

    /// Whether [`setup`](Self::setup) has completed.
    #[inline]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// The declared tag length, zero before setup.
    #[inline]
    pub const fn tag_len(&self) -> usize {
        self.tag_len
    }

    /// The declared message length.
    #[inline]
    pub const fn msg_len(&self) -> u64 {
        self.msg_len
    }

    /// The number of message bytes still expected.
    #[inline]
    pub const fn remaining(&self) -> u64 {
        self.msg_len - self.processed
    }

    fn mac_update(&mut self, cipher: &Cipher, data: &[u8]) {
        for byte in data {
            self.mac[self.mac_pos] ^= *byte;
            self.mac_pos += 1;

            if self.mac_pos == 16 {
                cipher.encrypt_scratch(&mut self.mac);
                self.mac_pos = 0;
            }
        }
    }

    fn mac_pad(&mut self, cipher: &Cipher) {
        if self.mac_pos != 0 {
            cipher.encrypt_scratch(&mut self.mac);
            self.mac_pos = 0;
        }
    }

    /// Declares the message and tag lengths and authenticates all associated data.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if called twice.
    /// - `InvalidParameters` if `tag_len` is not one of 4, 6, ..., 16, or `msg_len` does not
    ///   fit in the `15 - iv_len` byte length field.
    pub fn setup(&mut self, cipher: &Cipher, msg_len: u64, tag_len: usize, aad: &[u8]) -> Result<(), Error> {
        ensure!(!self.ready, InvalidState, "ccm setup twice");
        ensure!(valid_tag_len(tag_len), InvalidParameters, tag_len, "ccm tag length rejected");

        let l = self.l();
        ensure!(
            l >= 8 || msg_len < (1u64 << (8 * l)),
            InvalidParameters, msg_len, length_field = l, "ccm message too long for nonce"
        );

        let iv_len = self.iv_len;

        // B_0 = flags || N || Q
        let mut b0 = [0u8; MAX_BLOCK_SIZE];
        b0[0] = (if aad.is_empty() { 0 } else { 0x40 })
            | ((((tag_len - 2) / 2) as u8) << 3)
            | ((l - 1) as u8);
        b0[1..=iv_len].copy_from_slice(&self.iv[..iv_len]);
        b0[16 - l..].copy_from_slice(&msg_len.to_be_bytes()[8 - l..]);

        self.mac = b0;
        cipher.encrypt_scratch(&mut self.mac);

        if !aad.is_empty() {
            let len = aad.len() as u64;
            let mut prefix = [0u8; 10];

            let prefix_len = if len < 0xFF00 {
                prefix[..2].copy_from_slice(&(len as u16).to_be_bytes());
                2
            } else if len <= u64::from(u32::MAX) {
                prefix[..2].copy_from_slice(&[0xFF, 0xFE]);
                prefix[2..6].copy_from_slice(&(len as u32).to_be_bytes());
                6
            } else {
                prefix[..2].copy_from_slice(&[0xFF, 0xFF]);
                prefix[2..10].copy_from_slice(&len.to_be_bytes());
                10
            };

            self.mac_update(cipher, &prefix[..prefix_len]);
            self.mac_update(cipher, aad);
            self.mac_pad(cipher);
        }

        // A_i = flags || N || i
        self.counter = [0u8; MAX_BLOCK_SIZE];
        self.counter[0] = (l - 1) as u8;
        self.counter[1..=iv_len].copy_from_slice(&self.iv[..iv_len]);

        self.tag_mask = self.counter;
        cipher.encrypt_scratch(&mut self.tag_mask);
        increment_be(&mut self.counter[16 - l..]);

        self.msg_len = msg_len;
        self.tag_len = tag_len;
        self.ready = true;

        b0.zeroize();
        Ok(())
    }

    fn admit(&mut self, len: usize) -> Result<(), Error> {
        ensure!(self.ready, InvalidState, "ccm used before setup");
        ensure!(
            (len as u64) <= self.remaining(),
            InvalidState, len, remaining = self.remaining(), "ccm input exceeds declared length"
        );

        self.processed += len as u64;
        Ok(())
    }

    fn apply_keystream(&mut self, cipher: &Cipher, data: &mut [u8]) {
        let l = self.l();

        for byte in data {
            if self.ks_pos == 0 {
                self.keystream = self.counter;
                cipher.encrypt_scratch(&mut self.keystream);
                increment_be(&mut self.counter[16 - l..]);
            }

            *byte ^= self.keystream[self.ks_pos];
            self.ks_pos = (self.ks_pos + 1) % 16;
        }
    }

    /// Encrypts `data` in place.
    ///
    /// # Errors
    ///
    /// `InvalidState` before setup, or if the declared message length would be exceeded.
    pub fn encrypt_in_place(&mut self, cipher: &Cipher, data: &mut [u8]) -> Result<(), Error> {
        self.admit(data.len())?;
        self.mac_update(cipher, data);
        self.apply_keystream(cipher, data);
        Ok(())
    }

    /// Decrypts `data` in place.
    ///
    /// # Errors
    ///
    /// `InvalidState` before setup, or if the declared message length would be exceeded.
    pub fn decrypt_in_place(&mut self, cipher: &Cipher, data: &mut [u8]) -> Result<(), Error> {
        self.admit(data.len())?;
        self.apply_keystream(cipher, data);
        self.mac_update(cipher, data);
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

    /// Computes the tag into the front of the returned block, [`tag_len`](Self::tag_len) bytes.
    ///
    /// # Errors
    ///
    /// `InvalidState` before setup, or if fewer bytes than declared were processed.
    pub fn digest(&mut self, cipher: &Cipher) -> Result<Block, Error> {
        ensure!(self.ready, InvalidState, "ccm digest before setup");
        ensure!(
            self.processed == self.msg_len,
            InvalidState, remaining = self.remaining(), "ccm message shorter than declared"
        );

        self.mac_pad(cipher);

        let mut tag = self.mac;
        for (t, m) in tag.iter_mut().zip(self.tag_mask.iter()) {
            *t ^= *m;
        }

        tag[self.tag_len..].fill(0);
        Ok(tag)
    }
}

impl Zeroize for Ccm {
    #[inline]
    fn zeroize(&mut self) {
        self.iv.zeroize();
        self.mac.zeroize();
        self.mac_pos = 0;
        self.counter.zeroize();
        self.tag_mask.zeroize();
        self.keystream.zeroize();
        self.ks_pos = 0;
        self.ready = false;
    }
}

impl Drop for Ccm {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}
