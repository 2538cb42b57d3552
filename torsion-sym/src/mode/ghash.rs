//! GHASH, the universal hash of GCM
//!
//! The field multiplication is the bitwise shift-and-add over `u128` with masks in place of
//! branches, so the timing does not depend on the hash key or the data.

use zeroize::Zeroize;
use crate::buf::Block;

const R: u128 = 0xE1 << 120;

#[inline(always)]
const fn mask(bit: u128) -> u128 {
    0u128.wrapping_sub(bit)
}

/// Multiplication in GF(2^128) with the GCM bit ordering.
#[inline]
pub(crate) const fn gf_mul(x: u128, y: u128) -> u128 {
    let mut z = 0u128;
    let mut v = y;
    let mut i = 0;

    while i < 128 {
        z ^= v & mask((x >> (127 - i)) & 1);
        v = (v >> 1) ^ (R & mask(v & 1));
        i += 1;
    }

    z
}

/// Streaming GHASH over a sequence of zero padded segments.
pub struct Ghash {
    h: u128,
    y: u128,
    block: [u8; 16],
    pos: usize
}

opaque_dbg! { Ghash }

impl Ghash {
    /// Creates a GHASH instance for the hash key `h` (`E(0^128)` in GCM).
    pub const fn new(h: [u8; 16]) -> Self {
        Self { h: u128::from_be_bytes(h), y: 0, block: [0u8; 16], pos: 0 }
    }

    #[inline(always)]
    fn absorb(&mut self, block: [u8; 16]) {
        self.y = gf_mul(self.y ^ u128::from_be_bytes(block), self.h);
    }

    /// Absorbs `data`, buffering any partial block.
    pub fn update(&mut self, mut data: &[u8]) {
        if self.pos != 0 {
            let take = (16 - self.pos).min(data.len());
            self.block[self.pos..self.pos + take].copy_from_slice(&data[..take]);
            self.pos += take;
            data = &data[take..];

            if self.pos < 16 {
                return;
            }

            self.absorb(self.block);
            self.pos = 0;
        }

        let mut blocks = data.chunks_exact(16);
        for block in &mut blocks {
            let mut b = [0u8; 16];
            b.copy_from_slice(block);
            self.absorb(b);
        }

        let rest = blocks.remainder();
        self.block[..rest.len()].copy_from_slice(rest);
        self.pos = rest.len();
    }

    /// Zero pads and absorbs a buffered partial block, ending the current segment.
    pub fn pad(&mut self) {
        if self.pos != 0 {
            self.block[self.pos..].fill(0);
            self.absorb(self.block);
            self.pos = 0;
        }
    }

    /// Ends the final segment, absorbs the bit lengths, and returns the hash.
    pub fn finish(&mut self, aad_len: u64, ct_len: u64) -> Block {
        self.pad();

        let mut lens = [0u8; 16];
        lens[..8].copy_from_slice(&aad_len.wrapping_mul(8).to_be_bytes());
        lens[8..].copy_from_slice(&ct_len.wrapping_mul(8).to_be_bytes());
        self.absorb(lens);

        self.y.to_be_bytes()
    }
}

impl Zeroize for Ghash {
    #[inline]
    fn zeroize(&mut self) {
        self.h.zeroize();
        self.y.zeroize();
        self.block.zeroize();
        self.pos = 0;
    }
}

impl Drop for Ghash {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}
