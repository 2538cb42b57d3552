//! The Advanced Encryption Standard (FIPS-197)
//!
//! Byte oriented implementation, the S-boxes are generated at compile time from the field
//! inversion and affine transform rather than transcribed.

use zeroize::Zeroize;
use crate::error::Error;

/// The AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

const MAX_ROUNDS: usize = 14;
const SCHEDULE_LEN: usize = BLOCK_SIZE * (MAX_ROUNDS + 1);

const fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut p = 0u8;

    while b != 0 {
        if b & 1 != 0 {
            p ^= a;
        }

        let hi = a & 0x80;
        a <<= 1;

        if hi != 0 {
            a ^= 0x1b;
        }

        b >>= 1;
    }

    p
}

const fn gf_inv(a: u8) -> u8 {
    // a^254 = a^-1 in GF(2^8), zero maps to zero.
    let mut result = 1u8;
    let mut base = a;
    let mut e = 254u8;

    while e > 0 {
        if e & 1 != 0 {
            result = gf_mul(result, base);
        }
        base = gf_mul(base, base);
        e >>= 1;
    }

    if a == 0 { 0 } else { result }
}

const fn make_sbox() -> [u8; 256] {
    let mut sbox = [0u8; 256];
    let mut i = 0;

    while i < 256 {
        let x = gf_inv(i as u8);
        sbox[i] = x
            ^ x.rotate_left(1)
            ^ x.rotate_left(2)
            ^ x.rotate_left(3)
            ^ x.rotate_left(4)
            ^ 0x63;
        i += 1;
    }

    sbox
}

const fn make_inv_sbox(sbox: &[u8; 256]) -> [u8; 256] {
    let mut inv = [0u8; 256];
    let mut i = 0;

    while i < 256 {
        inv[sbox[i] as usize] = i as u8;
        i += 1;
    }

    inv
}

const SBOX_TABLE: [u8; 256] = make_sbox();

static SBOX: [u8; 256] = SBOX_TABLE;
static INV_SBOX: [u8; 256] = make_inv_sbox(&SBOX_TABLE);

const RCON: [u8; 10] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36];

#[inline(always)]
const fn xtime(x: u8) -> u8 {
    (x << 1) ^ (((x >> 7) & 1) * 0x1b)
}

#[inline(always)]
fn sub_word(word: u32) -> u32 {
    let b = word.to_be_bytes();
    u32::from_be_bytes([
        SBOX[b[0] as usize],
        SBOX[b[1] as usize],
        SBOX[b[2] as usize],
        SBOX[b[3] as usize],
    ])
}

/// An expanded AES key schedule.
///
/// The schedule is zeroed on drop.
#[derive(Clone)]
pub struct Aes {
    rounds: usize,
    schedule: [u8; SCHEDULE_LEN]
}

opaque_dbg! { Aes }

impl Aes {
    /// Expands a 128, 192, or 256-bit key.
    ///
    /// # Errors
    ///
    /// If the key is not 16, 24, or 32 bytes.
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        let rounds = match key.len() {
            16 => 10,
            24 => 12,
            32 => 14,
            len => bail!(InvalidKeySize, key_len = len, "aes key rejected")
        };

        let nk = key.len() / 4;
        let total = 4 * (rounds + 1);
        let mut words = [0u32; 4 * (MAX_ROUNDS + 1)];

        for (word, chunk) in words.iter_mut().zip(key.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        for i in nk..total {
            let mut temp = words[i - 1];

            if i % nk == 0 {
                temp = sub_word(temp.rotate_left(8)) ^ (u32::from(RCON[i / nk - 1]) << 24);
            } else if nk > 6 && i % nk == 4 {
                temp = sub_word(temp);
            }

            words[i] = words[i - nk] ^ temp;
        }

        let mut schedule = [0u8; SCHEDULE_LEN];

        for (out, word) in schedule.chunks_exact_mut(4).zip(words[..total].iter()) {
            out.copy_from_slice(&word.to_be_bytes());
        }

        words.zeroize();

        Ok(Self { rounds, schedule })
    }

    /// The number of rounds, 10, 12, or 14.
    #[inline]
    pub const fn rounds(&self) -> usize {
        self.rounds
    }

    #[inline(always)]
    fn add_round_key(&self, state: &mut [u8; 16], round: usize) {
        let rk = &self.schedule[round * BLOCK_SIZE..(round + 1) * BLOCK_SIZE];
        for (s, k) in state.iter_mut().zip(rk.iter()) {
            *s ^= *k;
        }
    }

    /// Encrypts a single 16 byte block in place.
    pub fn encrypt_block(&self, block: &mut [u8; 16]) {
        let state = block;

        self.add_round_key(state, 0);

        for round in 1..self.rounds {
            sub_bytes(state);
            shift_rows(state);
            mix_columns(state);
            self.add_round_key(state, round);
        }

        sub_bytes(state);
        shift_rows(state);
        self.add_round_key(state, self.rounds);
    }

    /// Decrypts a single 16 byte block in place.
    pub fn decrypt_block(&self, block: &mut [u8; 16]) {
        let state = block;

        self.add_round_key(state, self.rounds);

        for round in (1..self.rounds).rev() {
            inv_shift_rows(state);
            inv_sub_bytes(state);
            self.add_round_key(state, round);
            inv_mix_columns(state);
        }

        inv_shift_rows(state);
        inv_sub_bytes(state);
        self.add_round_key(state, 0);
    }
}

#[inline(always)]
fn sub_bytes(state: &mut [u8; 16]) {
    for b in state.iter_mut() {
        *b = SBOX[*b as usize];
    }
}

#[inline(always)]
fn inv_sub_bytes(state: &mut [u8; 16]) {
    for b in state.iter_mut() {
        *b = INV_SBOX[*b as usize];
    }
}

// column major: byte `4c + r` is row `r` of column `c`.
#[inline(always)]
fn shift_rows(state: &mut [u8; 16]) {
    let old = *state;
    for c in 0..4 {
        for r in 1..4 {
            state[4 * c + r] = old[4 * ((c + r) % 4) + r];
        }
    }
}

#[inline(always)]
fn inv_shift_rows(state: &mut [u8; 16]) {
    let old = *state;
    for c in 0..4 {
        for r in 1..4 {
            state[4 * ((c + r) % 4) + r] = old[4 * c + r];
        }
    }
}

#[inline(always)]
fn mix_columns(state: &mut [u8; 16]) {
    for col in state.chunks_exact_mut(4) {
        let (a0, a1, a2, a3) = (col[0], col[1], col[2], col[3]);
        let all = a0 ^ a1 ^ a2 ^ a3;

        col[0] ^= all ^ xtime(a0 ^ a1);
        col[1] ^= all ^ xtime(a1 ^ a2);
        col[2] ^= all ^ xtime(a2 ^ a3);
        col[3] ^= all ^ xtime(a3 ^ a0);
    }
}

#[inline(always)]
fn inv_mix_columns(state: &mut [u8; 16]) {
    for col in state.chunks_exact_mut(4) {
        // Precondition the column so that a forward mix yields the inverse.
        let u = xtime(xtime(col[0] ^ col[2]));
        let v = xtime(xtime(col[1] ^ col[3]));

        col[0] ^= u;
        col[1] ^= v;
        col[2] ^= u;
        col[3] ^= v;
    }

    mix_columns(state);
}

impl Zeroize for Aes {
    #[inline]
    fn zeroize(&mut self) {
        self.schedule.zeroize();
        self.rounds.zeroize();
    }
}

impl Drop for Aes {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const PLAIN: [u8; 16] = hex!("00112233445566778899aabbccddeeff");

    fn check(key: &[u8], expected: [u8; 16]) {
        let aes = Aes::new(key).unwrap();
        let mut block = PLAIN;

        aes.encrypt_block(&mut block);
        assert_eq!(block, expected);

        aes.decrypt_block(&mut block);
        assert_eq!(block, PLAIN);
    }

    #[test]
    fn sbox_spot_checks() {
        assert_eq!(SBOX[0x00], 0x63);
        assert_eq!(SBOX[0x01], 0x7c);
        assert_eq!(SBOX[0x53], 0xed);
        assert_eq!(SBOX[0xff], 0x16);
        assert_eq!(INV_SBOX[0x63], 0x00);
    }

    #[test]
    fn fips_197_aes_128() {
        check(&hex!("000102030405060708090a0b0c0d0e0f"), hex!("69c4e0d86a7b0430d8cdb78070b4c55a"));
    }

    #[test]
    fn fips_197_aes_192() {
        check(
            &hex!("000102030405060708090a0b0c0d0e0f1011121314151617"),
            hex!("dda97ca4864cdfe06eaf70a0ec0d7191")
        );
    }

    #[test]
    fn fips_197_aes_256() {
        check(
            &hex!("000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f"),
            hex!("8ea2b7ca516745bfeafc49904b496089")
        );
    }

    #[test]
    fn rejects_bad_key_sizes() {
        for len in [0usize, 1, 15, 17, 23, 25, 31, 33, 64] {
            let key = std::vec![0u8; len];
            assert!(Aes::new(&key).is_err(), "accepted {len} byte key");
        }
    }
}

#[cfg(all(test, not(miri)))]
mod property_tests {
    use super::*;
    use ::aes::cipher::{BlockEncrypt, BlockDecrypt, KeyInit, generic_array::GenericArray};
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(2000))]

        #[test]
        fn matches_rust_crypto_aes_128(key in any::<[u8; 16]>(), block in any::<[u8; 16]>()) {
            let ours = Aes::new(&key).unwrap();
            let theirs = ::aes::Aes128::new_from_slice(&key).unwrap();

            let mut a = block;
            let mut b = GenericArray::clone_from_slice(&block);

            ours.encrypt_block(&mut a);
            theirs.encrypt_block(&mut b);
            prop_assert_eq!(a.as_slice(), b.as_slice());

            ours.decrypt_block(&mut a);
            theirs.decrypt_block(&mut b);
            prop_assert_eq!(a, block);
            prop_assert_eq!(b.as_slice(), block.as_slice());
        }

        #[test]
        fn matches_rust_crypto_aes_192(key in any::<[u8; 24]>(), block in any::<[u8; 16]>()) {
            let ours = Aes::new(&key).unwrap();
            let theirs = ::aes::Aes192::new_from_slice(&key).unwrap();

            let mut a = block;
            let mut b = GenericArray::clone_from_slice(&block);

            ours.encrypt_block(&mut a);
            theirs.encrypt_block(&mut b);
            prop_assert_eq!(a.as_slice(), b.as_slice());
        }

        #[test]
        fn matches_rust_crypto_aes_256(key in any::<[u8; 32]>(), block in any::<[u8; 16]>()) {
            let ours = Aes::new(&key).unwrap();
            let theirs = ::aes::Aes256::new_from_slice(&key).unwrap();

            let mut a = block;
            let mut b = GenericArray::clone_from_slice(&block);

            ours.encrypt_block(&mut a);
            theirs.encrypt_block(&mut b);
            prop_assert_eq!(a.as_slice(), b.as_slice());

            ours.decrypt_block(&mut a);
            prop_assert_eq!(a, block);
        }
    }
}
