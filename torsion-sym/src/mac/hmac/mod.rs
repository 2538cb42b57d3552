//! Hashed-Based Message Authentication Codes `HMAC`.

pub mod algo;
mod digest;

#[doc(inline)]
pub use algo::{Sha224, Sha256, Sha384, Sha512, Hash};

non_fips! {
    #[doc(inline)]
    pub use algo::{Sha1, Md5};
}

pub use digest::Digest;

use ::digest::{KeyInit, Mac};
use ::hmac::SimpleHmac;
use crate::error::Error;
use crate::ct;

/// Hashed-Based Message Authentication Codes `HMAC`.
///
/// Keys of any length are accepted, the KDFs key `HMAC` with passwords.
///
/// # Example
///
/// ```
/// use torsion_sym::mac::hmac::{Hmac, Sha256};
///
/// # fn main() -> Result<(), torsion_sym::Error> {
/// let mut hmac = Hmac::<Sha256>::new(&[42u8; 32])?;
///
/// hmac.update(b"hello world, ");
/// hmac.update(b"beautiful weather.");
///
/// let parts = hmac.finalize();
///
/// let mut hmac = Hmac::<Sha256>::new(&[42u8; 32])?;
///
/// hmac.update(b"hello world, beautiful weather.");
///
/// let all = hmac.finalize();
///
/// assert_eq!(parts, all);
/// # Ok(()) }
/// ```
pub struct Hmac<H: Hash> {
    inner: SimpleHmac<H::Core>
}

impl<H: Hash> Clone for Hmac<H> {
    #[inline]
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<H: Hash> Hmac<H> {
    /// Create a new `Hmac` instance.
    ///
    /// # Errors
    ///
    /// `InvalidKeySize` if the MAC backend refuses the key, `HMAC` itself has no such limit.
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        match <SimpleHmac<H::Core> as KeyInit>::new_from_slice(key) {
            Ok(inner) => Ok(Self { inner }),
            Err(_) => bail!(InvalidKeySize, hash = H::NAME, "hmac key rejected")
        }
    }

    /// Updates the message to authenticate using `HMAC`.
    #[inline]
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        Mac::update(&mut self.inner, data);
        self
    }

    /// Compute the final hash of the `HMAC` instance's message into the `output` buffer.
    #[inline]
    pub fn finalize_into(self, output: &mut H::Digest) {
        output.as_mut().copy_from_slice(&self.inner.finalize().into_bytes());
    }

    /// Compute the final hash of the `HMAC` instance's message into the `output` buffer.
    ///
    /// # Errors
    ///
    /// `InvalidLength` if `output` is shorter than the digest.
    pub fn finalize_into_slice(self, output: &mut [u8]) -> Result<(), Error> {
        let size = <H::Digest as algo::Digest>::size();
        ensure!(output.len() >= size, InvalidLength, out_len = output.len(), "hmac output too short");

        output[..size].copy_from_slice(&self.inner.finalize().into_bytes());
        Ok(())
    }

    /// Compute the final hash of the `HMAC` instance's message.
    #[inline]
    pub fn finalize(self) -> Digest<H::Digest> {
        let mut out = <H::Digest as algo::Digest>::zeroes();
        self.finalize_into(&mut out);
        Digest::new(out)
    }

    /// Ensure that `other` is equivalent to the current message in constant-time.
    #[must_use]
    pub fn compare_digest(self, other: &[u8]) -> bool {
        ct::ct_eq(self.finalize(), other)
    }
}

/// One-shot `HMAC` over the concatenation of `parts`.
///
/// # Errors
///
/// See [`Hmac::new`].
pub fn mac<H: Hash>(key: &[u8], parts: &[&[u8]]) -> Result<Digest<H::Digest>, Error> {
    let mut hmac = Hmac::<H>::new(key)?;
    for part in parts {
        hmac.update(part);
    }
    Ok(hmac.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // RFC 4231 test case 2
    #[test]
    fn rfc4231_what_do_ya_want() {
        let tag = mac::<Sha256>(b"Jefe", &[b"what do ya want ", b"for nothing?"]).unwrap();
        assert_eq!(
            tag.as_ref(),
            hex!("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843")
        );
    }

    #[test]
    fn long_keys_are_hashed() {
        let key = [0xAAu8; 131];
        let tag = mac::<Sha256>(&key, &[b"Test Using Larger Than Block-Size Key - Hash Key First"])
            .unwrap();
        assert_eq!(
            tag.as_ref(),
            hex!("60e431591ee0b67f0d8a26aacbf5b77f8e0bc6213728c5140546040f0ee37f54")
        );
    }

    #[test]
    fn compare() {
        let mut a = Hmac::<Sha512>::new(b"key").unwrap();
        a.update(b"data");
        let expected = a.clone().finalize();

        assert!(a.clone().compare_digest(expected.as_ref()));
        assert!(!a.compare_digest(&[0u8; 64]));
    }

    #[test]
    fn slice_output() {
        let mut out = [0u8; 40];
        Hmac::<Sha1>::new(b"k").unwrap().finalize_into_slice(&mut out).unwrap();
        assert_eq!(out[20..], [0u8; 20]);

        assert_eq!(
            Hmac::<Sha1>::new(b"k").unwrap().finalize_into_slice(&mut out[..19]).unwrap_err().kind(),
            crate::ErrorKind::InvalidLength
        );
    }
}
