//! The `Poly1305` one-time authenticator (RFC 8439)
//!
//! Arithmetic is over five 26-bit limbs with 64-bit products, the final reduction selects
//! between `h` and `h - p` with a mask rather than a branch.

mod key;

pub use key::{GenericKey, Key, KeyRef, KEY_SIZE};

use zeroize::Zeroize;
use crate::aead::Tag;
use crate::ct;

const MASK26: u32 = 0x03ff_ffff;

#[inline(always)]
fn le32(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

/// The `Poly1305` Message Authentication Code (MAC)
///
/// # Example
///
/// ```
/// use torsion_sym::mac::{Poly1305, poly1305::Key};
///
/// let key: Key = [7u8; 32].into();
///
/// let mut poly = Poly1305::new(key.as_ref());
/// poly.update(b"hello world");
/// poly.update(b", how are you");
/// let tag = poly.finalize();
///
/// let o_tag = Poly1305::mac(key.as_ref(), b"hello world, how are you");
///
/// assert_eq!(tag, o_tag);
/// ```
pub struct Poly1305 {
    r: [u32; 5],
    s: [u32; 4],
    h: [u32; 5],
    buf: [u8; 16],
    pos: usize
}

opaque_dbg! { Poly1305 }

impl Poly1305 {
    /// Creates a new `Poly1305` instance with the provided one-time key.
    pub fn new<K: GenericKey>(key: K) -> Self {
        let k = key.bytes();

        Self {
            r: [
                le32(k, 0) & 0x03ff_ffff,
                (le32(k, 3) >> 2) & 0x03ff_ff03,
                (le32(k, 6) >> 4) & 0x03ff_c0ff,
                (le32(k, 9) >> 6) & 0x03f0_3fff,
                (le32(k, 12) >> 8) & 0x000f_ffff
            ],
            s: [le32(k, 16), le32(k, 20), le32(k, 24), le32(k, 28)],
            h: [0u32; 5],
            buf: [0u8; 16],
            pos: 0
        }
    }

    fn block(&mut self, m: &[u8; 16], hibit: u32) {
        let [r0, r1, r2, r3, r4] = self.r.map(u64::from);
        let (s1, s2, s3, s4) = (r1 * 5, r2 * 5, r3 * 5, r4 * 5);

        let h = &mut self.h;
        let h0 = u64::from(h[0].wrapping_add(le32(m, 0) & MASK26));
        let h1 = u64::from(h[1].wrapping_add((le32(m, 3) >> 2) & MASK26));
        let h2 = u64::from(h[2].wrapping_add((le32(m, 6) >> 4) & MASK26));
        let h3 = u64::from(h[3].wrapping_add((le32(m, 9) >> 6) & MASK26));
        let h4 = u64::from(h[4].wrapping_add((le32(m, 12) >> 8) | hibit));

        let d0 = h0 * r0 + h1 * s4 + h2 * s3 + h3 * s2 + h4 * s1;
        let mut d1 = h0 * r1 + h1 * r0 + h2 * s4 + h3 * s3 + h4 * s2;
        let mut d2 = h0 * r2 + h1 * r1 + h2 * r0 + h3 * s4 + h4 * s3;
        let mut d3 = h0 * r3 + h1 * r2 + h2 * r1 + h3 * r0 + h4 * s4;
        let mut d4 = h0 * r4 + h1 * r3 + h2 * r2 + h3 * r1 + h4 * r0;

        let m26 = u64::from(MASK26);

        let mut c = d0 >> 26;
        let mut t0 = d0 & m26;
        d1 += c;
        c = d1 >> 26;
        h[1] = (d1 & m26) as u32;
        d2 += c;
        c = d2 >> 26;
        h[2] = (d2 & m26) as u32;
        d3 += c;
        c = d3 >> 26;
        h[3] = (d3 & m26) as u32;
        d4 += c;
        c = d4 >> 26;
        h[4] = (d4 & m26) as u32;
        t0 += c * 5;
        c = t0 >> 26;
        h[0] = (t0 & m26) as u32;
        h[1] += c as u32;
    }

    /// Absorbs `data`.
    pub fn update(&mut self, mut data: &[u8]) {
        if self.pos != 0 {
            let take = (16 - self.pos).min(data.len());
            self.buf[self.pos..self.pos + take].copy_from_slice(&data[..take]);
            self.pos += take;
            data = &data[take..];

            if self.pos < 16 {
                return;
            }

            let block = self.buf;
            self.block(&block, 1 << 24);
            self.pos = 0;
        }

        let mut blocks = data.chunks_exact(16);
        for chunk in &mut blocks {
            let mut block = [0u8; 16];
            block.copy_from_slice(chunk);
            self.block(&block, 1 << 24);
        }

        let rest = blocks.remainder();
        self.buf[..rest.len()].copy_from_slice(rest);
        self.pos = rest.len();
    }

    /// Zero pads the message to a multiple of 16 bytes, as the AEAD construction requires.
    #[inline]
    pub fn pad(&mut self) {
        if self.pos != 0 {
            let fill = 16 - self.pos;
            self.update(&[0u8; 16][..fill]);
        }
    }

    /// Completes the computation, returning the tag.
    pub fn finalize(mut self) -> Tag {
        if self.pos != 0 {
            let mut block = [0u8; 16];
            block[..self.pos].copy_from_slice(&self.buf[..self.pos]);
            block[self.pos] = 1;
            self.block(&block, 0);
        }

        let [mut h0, mut h1, mut h2, mut h3, mut h4] = self.h;

        let mut c = h1 >> 26; h1 &= MASK26;
        h2 = h2.wrapping_add(c); c = h2 >> 26; h2 &= MASK26;
        h3 = h3.wrapping_add(c); c = h3 >> 26; h3 &= MASK26;
        h4 = h4.wrapping_add(c); c = h4 >> 26; h4 &= MASK26;
        h0 = h0.wrapping_add(c.wrapping_mul(5)); c = h0 >> 26; h0 &= MASK26;
        h1 = h1.wrapping_add(c);

        // g = h + 5 - 2^130
        let mut g0 = h0.wrapping_add(5); c = g0 >> 26; g0 &= MASK26;
        let mut g1 = h1.wrapping_add(c); c = g1 >> 26; g1 &= MASK26;
        let mut g2 = h2.wrapping_add(c); c = g2 >> 26; g2 &= MASK26;
        let mut g3 = h3.wrapping_add(c); c = g3 >> 26; g3 &= MASK26;
        let mut g4 = h4.wrapping_add(c).wrapping_sub(1 << 26);

        // all ones when h >= p
        let mask = (g4 >> 31).wrapping_sub(1);
        g0 &= mask; g1 &= mask; g2 &= mask; g3 &= mask; g4 &= mask;
        let keep = !mask;
        h0 = (h0 & keep) | g0;
        h1 = (h1 & keep) | g1;
        h2 = (h2 & keep) | g2;
        h3 = (h3 & keep) | g3;
        h4 = (h4 & keep) | g4;

        let words = [
            h0 | (h1 << 26),
            (h1 >> 6) | (h2 << 20),
            (h2 >> 12) | (h3 << 14),
            (h3 >> 18) | (h4 << 8)
        ];

        let mut out = [0u8; 16];
        let mut f = 0u64;
        for (i, (word, pad)) in words.iter().zip(self.s.iter()).enumerate() {
            f = u64::from(*word) + u64::from(*pad) + (f >> 32);
            out[i * 4..i * 4 + 4].copy_from_slice(&(f as u32).to_le_bytes());
        }

        Tag::new(out)
    }

    /// One-shot MAC of `data`.
    pub fn mac<K: GenericKey>(key: K, data: &[u8]) -> Tag {
        let mut poly = Self::new(key);
        poly.update(data);
        poly.finalize()
    }

    /// Constant time tag comparison.
    #[inline]
    pub fn verify(a: &[u8; 16], b: &[u8; 16]) -> bool {
        ct::ct_eq(a, b)
    }
}

impl Zeroize for Poly1305 {
    #[inline]
    fn zeroize(&mut self) {
        self.r.zeroize();
        self.s.zeroize();
        self.h.zeroize();
        self.buf.zeroize();
        self.pos = 0;
    }
}

impl Drop for Poly1305 {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}
