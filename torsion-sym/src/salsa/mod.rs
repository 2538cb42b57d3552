//! The `Salsa20` Stream Cipher
//!
//! Nonce layouts mirror [`chacha`](crate::chacha): 8 bytes (original), 12 bytes (the nonce
//! takes word 8 and the counter word 9), 16 bytes (nonce and counter words set directly), and
//! the extended 24, 28 and 32 byte nonces through [`derive`] (`HSalsa20`).
//!
//! The block counter spans state words 8 and 9.

use zeroize::Zeroize;
use crate::chacha::{GenericKey, Key, key_words, constants, le_word};
use crate::error::Error;

/// The size of one keystream block.
pub const BLOCK_SIZE: usize = 64;

/// The nonce lengths accepted by [`Salsa20::new`].
pub const NONCE_SIZES: [usize; 6] = [8, 12, 16, 24, 28, 32];

#[inline(always)]
fn quarter(x: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    x[b] ^= x[a].wrapping_add(x[d]).rotate_left(7);
    x[c] ^= x[b].wrapping_add(x[a]).rotate_left(9);
    x[d] ^= x[c].wrapping_add(x[b]).rotate_left(13);
    x[a] ^= x[d].wrapping_add(x[c]).rotate_left(18);
}

#[inline]
fn rounds(x: &mut [u32; 16]) {
    double_rounds(x, 10);
}

#[inline]
fn double_rounds(x: &mut [u32; 16], count: usize) {
    for _ in 0..count {
        quarter(x, 0, 4, 8, 12);
        quarter(x, 5, 9, 13, 1);
        quarter(x, 10, 14, 2, 6);
        quarter(x, 15, 3, 7, 11);
        quarter(x, 0, 1, 2, 3);
        quarter(x, 5, 6, 7, 4);
        quarter(x, 10, 11, 8, 9);
        quarter(x, 15, 12, 13, 14);
    }
}

/// The `Salsa20/8` core over a 64 byte block in place, as used by scrypt's `BlockMix`.
pub(crate) fn core8(block: &mut [u8; 64]) {
    let mut input = [0u32; 16];
    for (i, word) in input.iter_mut().enumerate() {
        *word = le_word(block, i * 4);
    }

    let mut x = input;
    double_rounds(&mut x, 4);

    for (i, (word, orig)) in x.iter().zip(input.iter()).enumerate() {
        block[i * 4..i * 4 + 4].copy_from_slice(&word.wrapping_add(*orig).to_le_bytes());
    }

    x.zeroize();
    input.zeroize();
}

/// Places the constants and key words, leaving words 6 to 9 for the nonce and counter.
#[inline]
fn setup<K: GenericKey>(x: &mut [u32; 16], key: &K) {
    let c = constants(key.slice().len());
    let k = key_words(key);

    x[0] = c[0];
    x[5] = c[1];
    x[10] = c[2];
    x[15] = c[3];
    x[1..5].copy_from_slice(&k[..4]);
    x[11..15].copy_from_slice(&k[4..]);
}

/// `HSalsa20`, derives a 256 bit subkey from `key` and a 16 byte nonce.
pub fn derive<K: GenericKey>(key: K, nonce: &[u8; 16]) -> [u8; 32] {
    let mut x = [0u32; 16];
    setup(&mut x, &key);

    for i in 0..4 {
        x[6 + i] = le_word(nonce, i * 4);
    }

    rounds(&mut x);

    let mut out = [0u8; 32];
    for (i, idx) in [0usize, 5, 10, 15, 6, 7, 8, 9].into_iter().enumerate() {
        out[i * 4..i * 4 + 4].copy_from_slice(&x[idx].to_le_bytes());
    }

    x.zeroize();
    out
}

/// The `Salsa20` Stream Cipher
///
/// # Warning
///
/// `Salsa20` alone does not ensure that the ciphertext is authentic.
pub struct Salsa20 {
    state: [u32; 16],
    stream: [u8; BLOCK_SIZE],
    /// Next unused byte of `stream`, in `0..=BLOCK_SIZE`. `BLOCK_SIZE` means the block is used up
    /// (or was never generated) and the next byte first generates a fresh block.
    pos: usize
}

opaque_dbg! { Salsa20 }

impl Salsa20 {
    /// Create a new `Salsa20` instance.
    ///
    /// `counter` is ignored for 16 and 32 byte nonces.
    ///
    /// # Errors
    ///
    /// `InvalidContext` unless the nonce is one of [`NONCE_SIZES`] bytes.
    pub fn new<K: GenericKey>(key: K, nonce: &[u8], counter: u64) -> Result<Self, Error> {
        let mut ctx = Self { state: [0u32; 16], stream: [0u8; BLOCK_SIZE], pos: BLOCK_SIZE };

        ensure!(
            NONCE_SIZES.contains(&nonce.len()),
            InvalidContext, nonce_len = nonce.len(), "salsa20 nonce size"
        );

        if nonce.len() >= 24 {
            let mut head = [0u8; 16];
            head.copy_from_slice(&nonce[..16]);

            let sub = Key::new_256(derive(key, &head));
            ctx.init(&sub, &nonce[16..], counter);
        } else {
            ctx.init(&key, nonce, counter);
        }

        Ok(ctx)
    }

    /// Create a new `Salsa20` instance from an unsized key.
    ///
    /// # Errors
    ///
    /// `InvalidKeySize` unless `key` is 16 or 32 bytes, otherwise see [`new`](Self::new).
    pub fn new_from_slice(key: &[u8], nonce: &[u8], counter: u64) -> Result<Self, Error> {
        Self::new(Key::try_from(key)?, nonce, counter)
    }

    fn init<K: GenericKey>(&mut self, key: &K, nonce: &[u8], counter: u64) {
        let s = &mut self.state;
        setup(s, key);

        s[6] = le_word(nonce, 0);
        s[7] = le_word(nonce, 4);

        match nonce.len() {
            8 => {
                s[8] = counter as u32;
                s[9] = (counter >> 32) as u32;
            },
            12 => {
                s[8] = le_word(nonce, 8);
                s[9] = counter as u32;
            },
            _ => {
                debug_assert_eq!(nonce.len(), 16);
                s[8] = le_word(nonce, 8);
                s[9] = le_word(nonce, 12);
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

        self.state[8] = self.state[8].wrapping_add(1);
        self.state[9] = self.state[9].wrapping_add(u32::from(self.state[8] == 0));

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
        ensure!(output.len() >= input.len(), InvalidLength, "salsa20 output too short");

        let out = &mut output[..input.len()];
        out.copy_from_slice(input);
        self.apply_keystream(out);
        Ok(())
    }

    /// Discards the rest of the current keystream block.
    #[inline]
    pub fn pad(&mut self) {
        self.stream.zeroize();
        self.pos = BLOCK_SIZE;
    }
}

impl Zeroize for Salsa20 {
    #[inline]
    fn zeroize(&mut self) {
        self.state.zeroize();
        self.stream.zeroize();
        self.pos = BLOCK_SIZE;
    }
}

impl Drop for Salsa20 {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn block_generated_lazily() {
        let mut salsa = Salsa20::new(&[3u8; 32], &[0u8; 8], 0).unwrap();
        assert_eq!(salsa.pos, BLOCK_SIZE);

        let mut whole = [0u8; 2 * BLOCK_SIZE];
        Salsa20::new(&[3u8; 32], &[0u8; 8], 0).unwrap().apply_keystream(&mut whole);

        let mut first = [0u8; BLOCK_SIZE];
        salsa.apply_keystream(&mut first);
        assert_eq!(salsa.pos, BLOCK_SIZE);
        assert_eq!(first, whole[..BLOCK_SIZE]);

        let mut next = [0u8; 1];
        salsa.apply_keystream(&mut next);
        assert_eq!(salsa.pos, 1);
        assert_eq!(next[0], whole[BLOCK_SIZE]);
    }

    #[test]
    fn nonce_sizes() {
        for len in 0..40 {
            let res = Salsa20::new(&[0u8; 32], &[0u8; 40][..len], 0);
            assert_eq!(res.is_ok(), NONCE_SIZES.contains(&len), "{len}");
        }

        assert_eq!(
            Salsa20::new_from_slice(&[0u8; 20], &[0u8; 8], 0).unwrap_err().kind(),
            ErrorKind::InvalidKeySize
        );
    }

    #[test]
    fn short_key_uses_tau() {
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];

        let mut long = [0u8; 32];
        long[..16].copy_from_slice(&[6u8; 16]);
        long[16..].copy_from_slice(&[6u8; 16]);

        Salsa20::new(&[6u8; 16], &[1u8; 8], 0).unwrap().apply_keystream(&mut a);
        Salsa20::new(&long, &[1u8; 8], 0).unwrap().apply_keystream(&mut b);

        // same key words, different constants
        assert_ne!(a, b);
    }

    #[test]
    fn twelve_byte_nonce_layout() {
        let mut nonce = [0u8; 12];
        nonce[..8].copy_from_slice(&[2u8; 8]);
        nonce[8] = 3;

        let mut twelve = Salsa20::new(&[8u8; 32], &nonce, 4).unwrap();

        let mut raw = [0u8; 16];
        raw[..8].copy_from_slice(&[2u8; 8]);
        raw[8] = 3;
        raw[12] = 4;
        let mut sixteen = Salsa20::new(&[8u8; 32], &raw, 0).unwrap();

        let mut a = [0u8; 70];
        let mut b = [0u8; 70];
        twelve.apply_keystream(&mut a);
        sixteen.apply_keystream(&mut b);
        assert_eq!(a, b);
    }
}

#[cfg(all(test, not(miri)))]
mod property_tests {
    use super::*;
    use crate::test_utils::{BoundList, chunk_sizes, chunks};
    use ::salsa20::cipher::{KeyIvInit, StreamCipher};
    use ::salsa20::cipher::generic_array::GenericArray;
    use proptest::prelude::*;
    use std::vec::Vec;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn matches_rust_crypto(
            key in any::<[u8; 32]>(),
            nonce in any::<[u8; 8]>(),
            input in any::<BoundList<512>>()
        ) {
            let mut ours = input.to_vec();
            Salsa20::new(&key, &nonce, 0).unwrap().apply_keystream(&mut ours);

            let mut theirs = input.to_vec();
            ::salsa20::Salsa20::new(GenericArray::from_slice(&key), GenericArray::from_slice(&nonce))
                .apply_keystream(&mut theirs);

            prop_assert_eq!(ours, theirs);
        }

        #[test]
        fn xsalsa_matches_rust_crypto(
            key in any::<[u8; 32]>(),
            nonce in any::<[u8; 24]>(),
            input in any::<BoundList<256>>()
        ) {
            let mut ours = input.to_vec();
            Salsa20::new(&key, &nonce, 0).unwrap().apply_keystream(&mut ours);

            let mut theirs = input.to_vec();
            ::salsa20::XSalsa20::new(GenericArray::from_slice(&key), GenericArray::from_slice(&nonce))
                .apply_keystream(&mut theirs);

            prop_assert_eq!(ours, theirs);
        }

        #[test]
        fn chunking_invariant(
            key in any::<[u8; 32]>(),
            nonce in any::<[u8; 12]>(),
            input in any::<BoundList<512>>(),
            sizes in chunk_sizes()
        ) {
            let mut whole = input.to_vec();
            Salsa20::new(&key, &nonce, 1).unwrap().apply_keystream(&mut whole);

            let mut split = Vec::new();
            let mut s = Salsa20::new(&key, &nonce, 1).unwrap();
            for chunk in chunks(&input, &sizes) {
                let mut buf = chunk.to_vec();
                s.apply_keystream(&mut buf);
                split.extend_from_slice(&buf);
            }

            prop_assert_eq!(whole, split);
        }

        #[test]
        fn block_boundaries(
            key in any::<[u8; 16]>(),
            nonce in any::<[u8; 8]>(),
            first in prop_oneof![Just(1usize), Just(63), Just(64), Just(65)]
        ) {
            let mut whole = [0x3Cu8; 200];
            Salsa20::new(&key, &nonce, 0).unwrap().apply_keystream(&mut whole);

            let mut split = [0x3Cu8; 200];
            let mut s = Salsa20::new(&key, &nonce, 0).unwrap();
            let (a, b) = split.split_at_mut(first);
            s.apply_keystream(a);
            s.apply_keystream(b);

            prop_assert_eq!(whole, split);
        }
    }
}
