//! Key Derivation Functions
//!
//! - [`pbkdf2`]: PBKDF2 over any `HMAC` [`Hash`].
//! - [`hkdf`]: RFC 5869 extract and expand.
//! - `scrypt`: the memory hard RFC 7914 KDF (requires `alloc`).
//! - `bcrypt`: the Blowfish based password hash, its record format and `bcrypt_pbkdf`.
//! - `eb2k`, `pgpdf`: the OpenSSL `EVP_BytesToKey` and OpenPGP S2K legacy derivations.

pub mod pbkdf2;
pub mod hkdf;

non_fips! {
    pub mod eb2k;
    pub mod pgpdf;
    pub mod bcrypt;
}

#[cfg(all(feature = "alloc", feature = "allow-non-fips"))]
#[cfg_attr(docsrs, doc(cfg(all(feature = "alloc", feature = "allow-non-fips"))))]
pub mod scrypt;

#[doc(inline)]
pub use pbkdf2::{pbkdf2, pbkdf2_into};

#[doc(inline)]
pub use crate::mac::hmac::algo::{Hash, Sha224, Sha256, Sha384, Sha512};

non_fips! {
    #[doc(inline)]
    pub use crate::mac::hmac::algo::{Sha1, Md5};
}

use core::num::NonZeroU32;
use crate::error::Error;
use crate::to_u32;

/// The number of iterations for PBKDF2.
///
/// The general rule is bigger is better (in terms of security), however, bigger is also more
/// computationally expensive.
///
/// `OWASP` recommends using at least 600,000 iterations with `SHA256` for passwords. [`NIST SP
/// 800-132, Section 5.2`][1] recommends anywhere from 1,000 to 10,000,000 iterations.
///
/// [1]: https://nvlpubs.nist.gov/nistpubs/Legacy/SP/nistspecialpublication800-132.pdf
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Iters { count: NonZeroU32 }

impl Iters {
    /// Create a new `Iters` instance.
    ///
    /// # Returns
    ///
    /// - `Some(Iters)`: The new `Iters` instance.
    /// - `None`: The provided `iters` argument was zero.
    pub const fn new(iters: u32) -> Option<Self> {
        // This is practically a no-op due to NPO.
        match NonZeroU32::new(iters) {
            Some(count) => Some(Self { count }),
            None => None
        }
    }

    /// Returns the contained iteration count as a `u32`.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.count.get()
    }
}

impl From<NonZeroU32> for Iters {
    #[inline]
    fn from(value: NonZeroU32) -> Self {
        Self { count: value }
    }
}

impl TryFrom<u32> for Iters {
    type Error = Error;

    /// Create a new `Iters` instance from a `u32`.
    ///
    /// # Errors
    ///
    /// `InvalidParameters` if the number of iterations was zero.
    #[inline]
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match Self::new(value) {
            Some(iters) => Ok(iters),
            None => bail!(InvalidParameters, "zero iterations")
        }
    }
}

impl TryFrom<usize> for Iters {
    type Error = Error;

    /// Create a new `Iters` instance from a `usize`.
    ///
    /// # Errors
    ///
    /// `InvalidParameters` if the number of iterations was zero or greater than [`u32::MAX`].
    #[inline]
    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match to_u32(value).and_then(Self::new) {
            Some(iters) => Ok(iters),
            None => bail!(InvalidParameters, iters = value, "iteration count out of range")
        }
    }
}

/// The number of `size` byte blocks covering `len` bytes, `None` on overflow.
#[inline]
pub(crate) const fn blocks(len: usize, size: usize) -> Option<usize> {
    match len.checked_add(size - 1) {
        Some(padded) => Some(padded / size),
        None => None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iters() {
        assert!(Iters::new(0).is_none());
        assert_eq!(Iters::new(7).unwrap().get(), 7);
        assert!(Iters::try_from(0u32).is_err());
        assert!(Iters::try_from(u32::MAX as usize + 1).is_err());
        assert_eq!(Iters::try_from(12usize).unwrap().get(), 12);
    }

    #[test]
    fn block_count() {
        assert_eq!(blocks(0, 32), Some(0));
        assert_eq!(blocks(1, 32), Some(1));
        assert_eq!(blocks(32, 32), Some(1));
        assert_eq!(blocks(33, 32), Some(2));
        assert_eq!(blocks(usize::MAX, 32), None);
    }
}
