//! The `ChaCha20` Stream Cipher
//!
//! Supports the original (8 byte nonce), IETF (12 byte nonce), and raw (16 byte nonce, which
//! also sets the block counter) layouts, plus the extended 24, 28 and 32 byte nonces, which
//! derive a subkey from the first 16 bytes with [`derive`] (`HChaCha20`) and use the remainder
//! as the nonce.
//!
//! The block counter spans state words 12 and 13 for every layout, a carry out of word 12
//! always propagates into word 13.

mod key;

pub use key::{Key, GenericKey};
pub(crate) use key::{key_words, constants, le_word};

use zeroize::Zeroize;
use crate::error::Error;

/// The size of one keystream block.
pub const BLOCK_SIZE: usize = 64;

/// The nonce lengths accepted by [`ChaCha20::new`].
pub const NONCE_SIZES: [usize; 6] = [8, 12, 16, 24, 28, 32];

#[inline(always)]
fn quarter(x: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    x[a] = x[a].wrapping_add(x[b]); x[d] = (x[d] ^ x[a]).rotate_left(16);
    x[c] = x[c].wrapping_add(x[d]); x[b] = (x[b] ^ x[c]).rotate_left(12);
    x[a] = x[a].wrapping_add(x[b]); x[d] = (x[d] ^ x[a]).rotate_left(8);
    x[c] = x[c].wrapping_add(x[d]); x[b] = (x[b] ^ x[c]).rotate_left(7);
}

#[inline]
fn rounds(x: &mut [u32; 16]) {
    for _ in 0..10 {
        quarter(x, 0, 4, 8, 12);
        quarter(x, 1, 5, 9, 13);
        quarter(x, 2, 6, 10, 14);
        quarter(x, 3, 7, 11, 15);
        quarter(x, 0, 5, 10, 15);
        quarter(x, 1, 6, 11, 12);
        quarter(x, 2, 7, 8, 13);
        quarter(x, 3, 4, 9, 14);
    }
}

/// `HChaCha20`, derives a 256 bit subkey from `key` and a 16 byte nonce.
pub fn derive<K: GenericKey>(key: K, nonce: &[u8; 16]) -> [u8; 32] {
    let mut x = [0u32; 16];
    x[..4].copy_from_slice(&constants(key.slice().len()));
    x[4..12].copy_from_slice(&key_words(&key));

    for i in 0..4 {
        x[12 + i] = le_word(nonce, i * 4);
    }

    rounds(&mut x);

    let mut out = [0u8; 32];
    for (i, word) in x[..4].iter().chain(x[12..].iter()).enumerate() {
        out[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
    }

    x.zeroize();
    out
}

/// The `ChaCha20` Stream Cipher
///
/// # Warning
///
/// `ChaCha20` alone does not ensure that the ciphertext is authentic, unless you have a reason
/// for using this directly, it is generally recommended to use `ChaCha20-Poly1305`.
///
/// # Example
///
/// ```
/// use torsion_sym::chacha::ChaCha20;
///
/// let mut enc = ChaCha20::new(&[7u8; 32], &[3u8; 12], 0)?;
/// let mut output = [0u8; 11];
/// enc.encrypt(b"hello world", &mut output)?;
///
/// let mut dec = ChaCha20::new(&[7u8; 32], &[3u8; 12], 0)?;
/// dec.apply_keystream(&mut output);
///
/// assert_eq!(b"hello world", &output);
/// # Ok::<(), torsion_sym::Error>(())
/// ```
pub struct ChaCha20 {
    state: [u32; 16],
    stream: [u8; BLOCK_SIZE],
    /// Next unused byte of `stream`, in `0..=BLOCK_SIZE`. `BLOCK_SIZE` means the block is used up
    /// (or was never generated) and the next byte first generates a fresh block.
    pos: usize
}

opaque_dbg! { ChaCha20 }

impl ChaCha20 {
    /// Create a new `ChaCha20` instance.
    ///
    /// # Arguments
    ///
    /// * `key` - The 128-bit or 256-bit key material.
    /// * `nonce` - One of [`NONCE_SIZES`] bytes.
    /// * `counter` - The initial block counter, ignored for 16 and 32 byte nonces.
    ///
    /// # Errors
    ///
    /// `InvalidContext` for any other nonce length.
    pub fn new<K: GenericKey>(key: K, nonce: &[u8], counter: u64) -> Result<Self, Error> {
        let mut ctx = Self { state: [0u32; 16], stream: [0u8; BLOCK_SIZE], pos: BLOCK_SIZE };

        if nonce.len() >= 24 && NONCE_SIZES.contains(&nonce.len()) {
            let mut head = [0u8; 16];
            head.copy_from_slice(&nonce[..16]);

            let sub = Key::new_256(derive(key, &head));
            ctx.init(&sub, &nonce[16..], counter);
        } else {
            ensure!(
                NONCE_SIZES.contains(&nonce.len()),
                InvalidContext, nonce_len = nonce.len(), "chacha20 nonce size"
            );
            ctx.init(&key, nonce, counter);
        }

        Ok(ctx)
    }

    /// Create a new `ChaCha20` instance from an unsized key.
    ///
    /// # Errors
    ///
    /// `InvalidKeySize` unless `key` is 16 or 32 bytes, otherwise see [`new`](Self::new).
    pub fn new_from_slice(key: &[u8], nonce: &[u8], counter: u64) -> Result<Self, Error> {
        Self::new(Key::try_from(key)?, nonce, counter)
    }

    fn init<K: GenericKey>(&mut self, key: &K, nonce: &[u8], counter: u64) {
        let s = &mut self.state;

        s[..4].copy_from_slice(&constants(key.slice().len()));
        s[4..12].copy_from_slice(&key_words(key));

        match nonce.len() {
            8 => {
                s[12] = counter as u32;
                s[13] = (counter >> 32) as u32;
                s[14] = le_word(nonce, 0);
                s[15] = le_word(nonce, 4);
            },
            12 => {
                s[12] = counter as u32;
                s[13] = le_word(nonce, 0);
                s[14] = le_word(nonce, 4);
                s[15] = le_word(nonce, 8);
            },
            _ => {
                debug_assert_eq!(nonce.len(), 16);
                for i in 0..4 {
                    s[12 + i] = le_word(nonce, i * 4);
                }
            }
        }

        self.pos = BLOCK_SIZE;
    }

    fn block(&mut self) {
        let mut x = self.state;
        rounds(&mut x);

        for (i, (word, input)) in x.iter().zip(self.state.iter()).enumerate() {
            self.stream[i * 4..i * 4 + 4].copy_from_slice(&word.wrapping_add(*input).to_le_bytes());
        }

        self.state[12] = self.state[12].wrapping_add(1);
        self.state[13] = self.state[13].wrapping_add(u32::from(self.state[12] == 0));

        x.zeroize();
        self.pos = 0;
    }

    /// XORs the keystream into `data` in place.
    pub fn apply_keystream(&mut self, data: &mut [u8]) {
        for byte in data {
            if self.pos == BLOCK_SIZE {
                self.block();
            }

            *byte ^= self.stream[self.pos];
            self.pos += 1;
        }
    }

    /// Encrypts (or decrypts) `input` into the front of `output`.
    ///
    /// # Errors
    ///
    /// `InvalidLength` if `output` is shorter than `input`.
    pub fn encrypt(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
        ensure!(output.len() >= input.len(), InvalidLength, "chacha20 output too short");

        let out = &mut output[..input.len()];
        out.copy_from_slice(input);
        self.apply_keystream(out);
        Ok(())
    }

    /// Discards the rest of the current keystream block, the next byte starts a new block.
    #[inline]
    pub fn pad(&mut self) {
        self.stream.zeroize();
        self.pos = BLOCK_SIZE;
    }

    /// The block counter of the next keystream block.
    #[inline]
    pub const fn counter(&self) -> u64 {
        (self.state[12] as u64) | ((self.state[13] as u64) << 32)
    }
}

impl Zeroize for ChaCha20 {
    #[inline]
    fn zeroize(&mut self) {
        self.state.zeroize();
        self.stream.zeroize();
        self.pos = BLOCK_SIZE;
    }
}

impl Drop for ChaCha20 {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use crate::ErrorKind;

    #[test]
    fn block_generated_lazily() {
        let mut chacha = ChaCha20::new(&[3u8; 32], &[0u8; 12], 5).unwrap();
        assert_eq!(chacha.pos, BLOCK_SIZE);
        assert_eq!(chacha.counter(), 5);

        let mut data = [0u8; BLOCK_SIZE];
        for chunk in data.chunks_mut(7) {
            chacha.apply_keystream(chunk);
            assert!(chacha.pos <= BLOCK_SIZE);
        }

        // exhausted, not yet refilled
        assert_eq!(chacha.pos, BLOCK_SIZE);
        assert_eq!(chacha.counter(), 6);

        chacha.apply_keystream(&mut [0u8; 1]);
        assert_eq!(chacha.pos, 1);
        assert_eq!(chacha.counter(), 7);
    }

    #[test]
    fn quarter_round_rfc8439() {
        let mut x = [0u32; 16];
        x[0] = 0x1111_1111;
        x[1] = 0x0102_0304;
        x[2] = 0x9b8d_6f43;
        x[3] = 0x0123_4567;

        quarter(&mut x, 0, 1, 2, 3);

        assert_eq!(x[..4], [0xea2a_92f4, 0xcb1c_f8ce, 0x4581_472e, 0x5881_c4bb]);
    }

    #[test]
    fn hchacha20_draft_vector() {
        let key = hex!("000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f");
        let nonce = hex!("000000090000004a0000000031415927");

        assert_eq!(
            derive(&key, &nonce),
            hex!("82413b4227b27bfed30e42508a877d73a0f9e4d58a74a853c12ec41326d3ecdc")
        );
    }

    #[test]
    fn nonce_sizes() {
        for len in 0..40 {
            let res = ChaCha20::new(&[0u8; 32], &[0u8; 40][..len], 0);
            assert_eq!(res.is_ok(), NONCE_SIZES.contains(&len), "{len}");
        }

        assert_eq!(
            ChaCha20::new(&[0u8; 32], &[0u8; 13], 0).unwrap_err().kind(),
            ErrorKind::InvalidContext
        );
    }

    #[test]
    fn counter_carries_into_word_13() {
        let mut c = ChaCha20::new(&[1u8; 32], &[2u8; 8], u64::from(u32::MAX)).unwrap();
        c.apply_keystream(&mut [0u8; 1]);
        assert_eq!(c.counter(), 1 << 32);
    }

    #[test]
    fn sixteen_byte_nonce_sets_counter() {
        let mut nonce = [0u8; 16];
        nonce[0] = 5;
        nonce[8..].copy_from_slice(&[9u8; 8]);

        let mut raw = ChaCha20::new(&[3u8; 32], &nonce, 1234).unwrap();
        let mut legacy = ChaCha20::new(&[3u8; 32], &[9u8; 8], 5).unwrap();

        let mut a = [0u8; 100];
        let mut b = [0u8; 100];
        raw.apply_keystream(&mut a);
        legacy.apply_keystream(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn pad_skips_to_next_block() {
        let mut padded = ChaCha20::new(&[4u8; 32], &[5u8; 12], 0).unwrap();
        padded.apply_keystream(&mut [0u8; 10]);
        padded.pad();
        let mut a = [0u8; 64];
        padded.apply_keystream(&mut a);

        let mut fresh = ChaCha20::new(&[4u8; 32], &[5u8; 12], 1).unwrap();
        let mut b = [0u8; 64];
        fresh.apply_keystream(&mut b);

        assert_eq!(a, b);
    }

    #[test]
    fn encrypt_output_length() {
        let mut c = ChaCha20::new(&[0u8; 16], &[0u8; 8], 0).unwrap();
        assert_eq!(c.encrypt(&[0; 4], &mut [0u8; 3]).unwrap_err().kind(), ErrorKind::InvalidLength);
    }
}
