//! The International Data Encryption Algorithm

use zeroize::Zeroize;
use crate::error::Error;

/// The IDEA block size in bytes.
pub const BLOCK_SIZE: usize = 8;
/// The IDEA key size in bytes.
pub const KEY_SIZE: usize = 16;

const ROUNDS: usize = 8;
const SUBKEYS: usize = 6 * ROUNDS + 4;

// multiplication modulo 2^16 + 1, where zero stands for 2^16.
#[inline(always)]
fn mul(a: u16, b: u16) -> u16 {
    let a = if a == 0 { 0x1_0000u64 } else { u64::from(a) };
    let b = if b == 0 { 0x1_0000u64 } else { u64::from(b) };
    ((a * b) % 0x1_0001) as u16
}

// x^(p - 2) mod p, 0 (2^16) is its own inverse.
fn mul_inv(x: u16) -> u16 {
    if x <= 1 {
        return x;
    }

    let mut result = 1u64;
    let mut base = u64::from(x);
    let mut exp = 0x1_0001u64 - 2;

    while exp > 0 {
        if exp & 1 == 1 {
            result = (result * base) % 0x1_0001;
        }
        base = (base * base) % 0x1_0001;
        exp >>= 1;
    }

    result as u16
}

#[inline(always)]
const fn add_inv(x: u16) -> u16 {
    0u16.wrapping_sub(x)
}

/// An expanded IDEA key schedule (encryption and decryption subkeys).
#[derive(Clone)]
pub struct Idea {
    ek: [u16; SUBKEYS],
    dk: [u16; SUBKEYS]
}

opaque_dbg! { Idea }

impl Idea {
    /// Expands a 128-bit key.
    ///
    /// # Errors
    ///
    /// If the key is not exactly 16 bytes.
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        let Ok(raw) = <[u8; KEY_SIZE]>::try_from(key) else {
            bail!(InvalidKeySize, key_len = key.len(), "idea key rejected");
        };

        let mut k = u128::from_be_bytes(raw);
        let mut ek = [0u16; SUBKEYS];

        // each group of eight subkeys is the key rotated left by another 25 bits.
        for (i, sub) in ek.iter_mut().enumerate() {
            if i != 0 && i % 8 == 0 {
                k = k.rotate_left(25);
            }
            *sub = (k >> (112 - 16 * (i % 8))) as u16;
        }

        k.zeroize();

        let mut dk = [0u16; SUBKEYS];

        dk[0] = mul_inv(ek[48]);
        dk[1] = add_inv(ek[49]);
        dk[2] = add_inv(ek[50]);
        dk[3] = mul_inv(ek[51]);

        for r in 1..ROUNDS {
            let base = 6 * (ROUNDS - r);
            dk[6 * r - 2] = ek[base + 4];
            dk[6 * r - 1] = ek[base + 5];
            dk[6 * r] = mul_inv(ek[base]);
            dk[6 * r + 1] = add_inv(ek[base + 2]);
            dk[6 * r + 2] = add_inv(ek[base + 1]);
            dk[6 * r + 3] = mul_inv(ek[base + 3]);
        }

        dk[46] = ek[4];
        dk[47] = ek[5];
        dk[48] = mul_inv(ek[0]);
        dk[49] = add_inv(ek[1]);
        dk[50] = add_inv(ek[2]);
        dk[51] = mul_inv(ek[3]);

        Ok(Self { ek, dk })
    }

    fn crypt(keys: &[u16; SUBKEYS], block: &mut [u8; BLOCK_SIZE]) {
        let mut x1 = u16::from_be_bytes([block[0], block[1]]);
        let mut x2 = u16::from_be_bytes([block[2], block[3]]);
        let mut x3 = u16::from_be_bytes([block[4], block[5]]);
        let mut x4 = u16::from_be_bytes([block[6], block[7]]);

        for k in keys[..6 * ROUNDS].chunks_exact(6) {
            x1 = mul(x1, k[0]);
            x2 = x2.wrapping_add(k[1]);
            x3 = x3.wrapping_add(k[2]);
            x4 = mul(x4, k[3]);

            let mut t0 = mul(x1 ^ x3, k[4]);
            let t1 = mul((x2 ^ x4).wrapping_add(t0), k[5]);
            t0 = t0.wrapping_add(t1);

            x1 ^= t1;
            x4 ^= t0;

            let swap = x2 ^ t0;
            x2 = x3 ^ t1;
            x3 = swap;
        }

        // the output transform undoes the final swap.
        let y1 = mul(x1, keys[48]);
        let y2 = x3.wrapping_add(keys[49]);
        let y3 = x2.wrapping_add(keys[50]);
        let y4 = mul(x4, keys[51]);

        block[0..2].copy_from_slice(&y1.to_be_bytes());
        block[2..4].copy_from_slice(&y2.to_be_bytes());
        block[4..6].copy_from_slice(&y3.to_be_bytes());
        block[6..8].copy_from_slice(&y4.to_be_bytes());
    }

    /// Encrypts a single 8 byte block in place.
    #[inline]
    pub fn encrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) {
        Self::crypt(&self.ek, block);
    }

    /// Decrypts a single 8 byte block in place.
    #[inline]
    pub fn decrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) {
        Self::crypt(&self.dk, block);
    }
}

impl Zeroize for Idea {
    #[inline]
    fn zeroize(&mut self) {
        self.ek.zeroize();
        self.dk.zeroize();
    }
}

impl Drop for Idea {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_inverse_identity() {
        for x in [0u16, 1, 2, 3, 0x1234, 0x8000, 0xFFFF] {
            assert_eq!(mul(x, mul_inv(x)), 1, "x = {x:#x}");
        }
    }

    #[test]
    fn round_trip() {
        let idea = Idea::new(&[0x42; 16]).unwrap();
        let mut block = *b"8 bytes!";

        idea.encrypt_block(&mut block);
        assert_ne!(&block, b"8 bytes!");

        idea.decrypt_block(&mut block);
        assert_eq!(&block, b"8 bytes!");
    }

    #[test]
    fn rejects_bad_key() {
        assert!(Idea::new(&[0u8; 15]).is_err());
        assert!(Idea::new(&[0u8; 17]).is_err());
    }
}
