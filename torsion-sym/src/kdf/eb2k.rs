//! OpenSSL's legacy `EVP_BytesToKey` (EB2K) with a single iteration.
//!
//! Each round hashes the previous digest, the password and the salt. The output is consumed
//! first by the key then by the IV.

use zeroize::Zeroize;
use crate::error::Error;
use crate::mac::hmac::algo::{Hash, Digest, finish};

/// The salt length OpenSSL writes after `Salted__`.
pub const SALT_SIZE: usize = 8;

/// Fill `key` then `iv` from `password` and `salt`.
///
/// Salts longer than [`SALT_SIZE`] are truncated to it.
///
/// # Errors
///
/// `InvalidParameters` if the (truncated) salt is neither empty nor [`SALT_SIZE`] bytes.
///
/// # Example
///
/// ```
/// use torsion_sym::kdf::{eb2k, Md5};
///
/// let mut key = [0u8; 32];
/// let mut iv = [0u8; 16];
/// eb2k::derive::<Md5>(b"password", b"saltsalt", &mut key, &mut iv).unwrap();
/// ```
pub fn derive<H: Hash>(
    password: &[u8],
    salt: &[u8],
    key: &mut [u8],
    iv: &mut [u8]
) -> Result<(), Error> {
    let salt = &salt[..salt.len().min(SALT_SIZE)];
    ensure!(
        salt.is_empty() || salt.len() == SALT_SIZE,
        InvalidParameters, salt_len = salt.len(), "eb2k salt must be 0 or 8 bytes"
    );

    let mut prev = <H::Digest as Digest>::zeroes();
    let mut first = true;
    let (mut key_pos, mut iv_pos) = (0usize, 0usize);

    while key_pos < key.len() || iv_pos < iv.len() {
        let mut core = <H::Core as ::digest::Digest>::new();
        if !first {
            ::digest::Digest::update(&mut core, prev.as_ref());
        }
        ::digest::Digest::update(&mut core, password);
        ::digest::Digest::update(&mut core, salt);
        prev = finish::<H>(core);
        first = false;

        let mut avail = prev.as_ref();

        let take = avail.len().min(key.len() - key_pos);
        key[key_pos..key_pos + take].copy_from_slice(&avail[..take]);
        key_pos += take;
        avail = &avail[take..];

        let take = avail.len().min(iv.len() - iv_pos);
        iv[iv_pos..iv_pos + take].copy_from_slice(&avail[..take]);
        iv_pos += take;
    }

    prev.zeroize();
    Ok(())
}
