//! The scrypt memory hard key derivation function (RFC 7914)
//!
//! `PBKDF2-HMAC-SHA256` seeds `p` blocks of `128 * r` bytes, each block is passed through
//! `SMix` over `N` entries of scratch memory, and a final `PBKDF2` pass stretches the mixed
//! blocks into the output. All scratch buffers are zeroed when dropped.

use core::num::NonZeroU32;
use crate::buf::{SecretBuf, xor_in_place};
use crate::error::Error;
use crate::kdf::{pbkdf2_into, Iters, Sha256};
use crate::salsa::core8;
use zeroize::Zeroize;

/// Validated scrypt cost parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Params {
    n: u64,
    r: u32,
    p: u32
}

impl Params {
    /// Check the cost parameters.
    ///
    /// # Errors
    ///
    /// `InvalidParameters` unless all of:
    ///
    /// - `r` and `p` are non-zero,
    /// - `n` is a power of two no larger than `u32::MAX`,
    /// - `r * p < 2^25`, `r < 2^24` and `r * n < 2^25`.
    pub fn new(n: u64, r: u32, p: u32) -> Result<Self, Error> {
        let (r64, p64) = (u64::from(r), u64::from(p));

        ensure!(r != 0 && p != 0, InvalidParameters, r, p, "scrypt r and p must be non-zero");
        ensure!(
            n != 0 && n <= u64::from(u32::MAX) && n.is_power_of_two(),
            InvalidParameters, n, "scrypt n must be a power of two"
        );
        ensure!(r64 * p64 < (1 << 25), InvalidParameters, r, p, "scrypt r * p too large");
        ensure!(r < (1 << 24), InvalidParameters, r, "scrypt r too large");
        ensure!(r64 * n < (1 << 25), InvalidParameters, r, n, "scrypt r * n too large");

        Ok(Self { n, r, p })
    }

    /// The CPU / memory cost, a power of two.
    #[inline]
    pub const fn n(&self) -> u64 {
        self.n
    }

    /// The block size factor.
    #[inline]
    pub const fn r(&self) -> u32 {
        self.r
    }

    /// The parallelization factor.
    #[inline]
    pub const fn p(&self) -> u32 {
        self.p
    }
}

const ONE: Iters = Iters { count: NonZeroU32::MIN };

fn block_mix(b: &mut [u8], y: &mut [u8], r: usize) {
    let mut x = [0u8; 64];
    x.copy_from_slice(&b[(2 * r - 1) * 64..]);

    for (i, chunk) in b.chunks_exact(64).enumerate() {
        xor_in_place(&mut x, chunk);
        core8(&mut x);
        y[i * 64..(i + 1) * 64].copy_from_slice(&x);
    }

    // even blocks first, then the odd ones
    for i in 0..r {
        b[i * 64..(i + 1) * 64].copy_from_slice(&y[2 * i * 64..(2 * i + 1) * 64]);
        b[(i + r) * 64..(i + r + 1) * 64].copy_from_slice(&y[(2 * i + 1) * 64..(2 * i + 2) * 64]);
    }

    x.zeroize();
}

#[inline]
fn integerify(x: &[u8], r: usize) -> u64 {
    let at = (2 * r - 1) * 64;
    let mut word = [0u8; 8];
    word.copy_from_slice(&x[at..at + 8]);
    u64::from_le_bytes(word)
}

fn smix(b: &mut [u8], r: usize, n: usize, v: &mut [u8], xy: &mut [u8]) {
    let len = 128 * r;
    let (x, y) = xy.split_at_mut(len);
    x.copy_from_slice(b);

    for entry in v.chunks_exact_mut(len).take(n) {
        entry.copy_from_slice(x);
        block_mix(x, y, r);
    }

    for _ in 0..n {
        let j = (integerify(x, r) & (n as u64 - 1)) as usize;
        xor_in_place(x, &v[j * len..(j + 1) * len]);
        block_mix(x, y, r);
    }

    b.copy_from_slice(x);
}

/// Derive `out.len()` bytes from `password` and `salt`.
///
/// # Errors
///
/// - `InvalidParameters` if the scratch memory cannot be allocated.
/// - See [`pbkdf2_into`] for output length limits.
///
/// # Example
///
/// ```
/// use torsion_sym::kdf::scrypt::{derive, Params};
///
/// let params = Params::new(1024, 8, 1).unwrap();
/// let mut key = [0u8; 32];
/// derive(b"password", b"NaCl", &params, &mut key).unwrap();
/// ```
pub fn derive(password: &[u8], salt: &[u8], params: &Params, out: &mut [u8]) -> Result<(), Error> {
    if out.is_empty() {
        return Ok(());
    }

    // bounded by the parameter checks, 128 * r * n < 2^32
    let r = params.r as usize;
    let p = params.p as usize;
    let n = params.n as usize;
    let len = 128 * r;

    let mut b = SecretBuf::zeroed(len * p)?;
    let mut xy = SecretBuf::zeroed(2 * len)?;
    let mut v = SecretBuf::zeroed(len * n)?;

    pbkdf2_into::<Sha256>(password, salt, ONE, &mut b)?;

    for block in b.chunks_exact_mut(len) {
        smix(block, r, n, &mut v, &mut xy);
    }

    pbkdf2_into::<Sha256>(password, &b, ONE, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use hex_literal::hex;

    #[test]
    fn rfc7914_empty() {
        let mut out = [0u8; 64];
        derive(b"", b"", &Params::new(16, 1, 1).unwrap(), &mut out).unwrap();
        assert_eq!(
            out,
            hex!(
                "77d6576238657b203b19ca42c18a0497f16b4844e3074ae8dfdffa3fede21442"
                "fcd0069ded0948f8326a753a0fc81f17e8d3e0fb2e0d3628cf35e20c38d18906"
            )
        );
    }

    #[test]
    fn rfc7914_nacl() {
        let mut out = [0u8; 64];
        derive(b"password", b"NaCl", &Params::new(1024, 8, 16).unwrap(), &mut out).unwrap();
        assert_eq!(
            out,
            hex!(
                "fdbabe1c9d3472007856e7190d01e9fe7c6ad7cbc8237830e77376634b373162"
                "2eaf30d92e22a3886ff109279d9830dac727afb94a83ee6d8360cbdfa2cc0640"
            )
        );
    }

    #[test]
    fn parameter_bounds() {
        let bad = [
            (16, 0, 1),
            (16, 1, 0),
            (0, 1, 1),
            (15, 1, 1),
            (1 << 33, 1, 1),
            (2, 1 << 24, 1),
            (2, 1 << 12, 1 << 13),
            (1 << 17, 1 << 8, 1)
        ];

        for (n, r, p) in bad {
            assert_eq!(
                Params::new(n, r, p).unwrap_err().kind(),
                ErrorKind::InvalidParameters,
                "n={n} r={r} p={p}"
            );
        }

        assert!(Params::new(1 << 16, 8, 1).is_ok());
        assert!(Params::new(1, 1, 1).is_ok());
    }

    #[test]
    fn empty_output_skips_work() {
        let params = Params::new(1 << 16, 8, 1).unwrap();
        assert!(derive(b"pw", b"salt", &params, &mut []).is_ok());
    }
}
