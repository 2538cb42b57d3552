//! OpenPGP string-to-key derivation (RFC 4880 §3.7.1)
//!
//! Output block `i` is the hash of `i` zero bytes followed by the (salted, possibly repeated)
//! password.

use zeroize::Zeroize;
use crate::error::Error;
use crate::mac::hmac::algo::{Hash, Digest, finish};

#[inline]
fn fill<H: Hash, F>(out: &mut [u8], mut body: F)
    where F: FnMut(&mut H::Core)
{
    let size = <H::Digest as Digest>::size();

    for (i, chunk) in out.chunks_mut(size).enumerate() {
        let mut core = <H::Core as ::digest::Digest>::new();
        for _ in 0..i {
            ::digest::Digest::update(&mut core, [0u8]);
        }
        body(&mut core);

        let mut digest = finish::<H>(core);
        chunk.copy_from_slice(&digest.as_ref()[..chunk.len()]);
        digest.zeroize();
    }
}

/// Simple S2K, the hash of the password alone.
pub fn simple<H: Hash>(password: &[u8], out: &mut [u8]) {
    salted::<H>(password, &[], out);
}

/// Salted S2K, the hash of the salt and password.
pub fn salted<H: Hash>(password: &[u8], salt: &[u8], out: &mut [u8]) {
    fill::<H, _>(out, |core| {
        ::digest::Digest::update(core, salt);
        ::digest::Digest::update(core, password);
    });
}

/// Iterated and salted S2K, hashes `count` bytes of the repeated `salt || password`.
///
/// A `count` shorter than one `salt || password` is raised to it, the final repetition is
/// truncated to exactly `count` bytes.
///
/// # Errors
///
/// `InvalidParameters` if the byte counts overflow.
///
/// # Example
///
/// ```
/// use torsion_sym::kdf::{pgpdf, Sha256};
///
/// let mut key = [0u8; 32];
/// pgpdf::iterated::<Sha256>(b"password", b"12345678", 65536, &mut key).unwrap();
/// ```
pub fn iterated<H: Hash>(
    password: &[u8],
    salt: &[u8],
    count: usize,
    out: &mut [u8]
) -> Result<(), Error> {
    let Some(combined) = salt.len().checked_add(password.len()) else {
        bail!(InvalidParameters, "pgpdf input length overflow")
    };

    let count = count.max(combined);
    ensure!(count.checked_add(combined).is_some(), InvalidParameters, count, "pgpdf count overflow");

    fill::<H, _>(out, |core| {
        let mut written = 0usize;

        // nothing to repeat for an empty salt and password
        while written < count && combined != 0 {
            if written + combined > count {
                let todo = count - written;

                if todo < salt.len() {
                    ::digest::Digest::update(core, &salt[..todo]);
                } else {
                    ::digest::Digest::update(core, salt);
                    ::digest::Digest::update(core, &password[..todo - salt.len()]);
                }

                break;
            }

            ::digest::Digest::update(core, salt);
            ::digest::Digest::update(core, password);
            written += combined;
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mac::hmac::{Md5, Sha1};

    #[test]
    fn simple_is_plain_hash() {
        let mut out = [0u8; 16];
        simple::<Md5>(b"hello", &mut out);
        assert_eq!(out, Md5::hash(&[b"hello"]));
    }

    #[test]
    fn later_blocks_are_zero_prefixed() {
        let mut out = [0u8; 40];
        salted::<Sha1>(b"pw", b"salt", &mut out);

        assert_eq!(out[..20], Sha1::hash(&[b"salt", b"pw"]));
        assert_eq!(out[20..40], Sha1::hash(&[&[0u8], b"salt", b"pw"]));
    }

    #[test]
    fn iterated_truncates_last_repetition() {
        let mut out = [0u8; 20];
        iterated::<Sha1>(b"abc", b"xy", 12, &mut out).unwrap();

        // "xyabc" "xyabc" "xy"
        assert_eq!(out, Sha1::hash(&[b"xyabcxyabcxy"]));

        iterated::<Sha1>(b"abc", b"xy", 13, &mut out).unwrap();
        assert_eq!(out, Sha1::hash(&[b"xyabcxyabcxya"]));
    }

    #[test]
    fn small_count_is_raised() {
        let mut a = [0u8; 20];
        let mut b = [0u8; 20];
        iterated::<Sha1>(b"abc", b"xy", 0, &mut a).unwrap();
        salted::<Sha1>(b"abc", b"xy", &mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_inputs_terminate() {
        let mut out = [0u8; 20];
        iterated::<Sha1>(b"", b"", 1000, &mut out).unwrap();
        assert_eq!(out, Sha1::hash(&[]));
    }

    #[test]
    fn overflow_rejected() {
        let mut out = [0u8; 20];
        assert_eq!(
            iterated::<Sha1>(b"abc", b"xy", usize::MAX, &mut out).unwrap_err().kind(),
            crate::ErrorKind::InvalidParameters
        );
    }
}
