//! The HMAC-based Extract-and-Expand Key Derivation Function (RFC 5869)

use zeroize::Zeroize;
use crate::error::Error;
use crate::kdf::blocks;
use crate::mac::hmac::{Hmac, Digest as HmacDigest};
use crate::mac::hmac::algo::{Hash, Digest};

/// The most blocks `expand` may produce, the counter is a single byte.
pub const MAX_BLOCKS: usize = 255;

/// `HKDF-Extract`, compress `ikm` into a pseudorandom key keyed by `salt`.
///
/// # Errors
///
/// See [`Hmac::new`].
pub fn extract<H: Hash>(ikm: &[u8], salt: &[u8]) -> Result<HmacDigest<H::Digest>, Error> {
    let mut hmac = Hmac::<H>::new(salt)?;
    hmac.update(ikm);
    Ok(hmac.finalize())
}

/// `HKDF-Expand`, stretch `prk` into `out.len()` bytes bound to `info`.
///
/// # Errors
///
/// `InvalidParameters` if `out` needs more than [`MAX_BLOCKS`] hash outputs.
pub fn expand<H: Hash>(prk: &[u8], info: &[u8], out: &mut [u8]) -> Result<(), Error> {
    let size = <H::Digest as Digest>::size();

    match blocks(out.len(), size) {
        Some(count) if count <= MAX_BLOCKS => {},
        _ => bail!(InvalidParameters, out_len = out.len(), hash = H::NAME, "hkdf output too long")
    }

    if out.is_empty() {
        return Ok(());
    }

    let pmac = Hmac::<H>::new(prk)?;
    let mut prev = <H::Digest as Digest>::zeroes();

    for (i, chunk) in out.chunks_mut(size).enumerate() {
        let mut hmac = pmac.clone();
        if i != 0 {
            hmac.update(prev.as_ref());
        }
        hmac.update(info);
        hmac.update(&[(i + 1) as u8]);
        hmac.finalize_into(&mut prev);

        chunk.copy_from_slice(&prev.as_ref()[..chunk.len()]);
    }

    prev.zeroize();
    Ok(())
}

/// Extract then expand.
///
/// # Errors
///
/// See [`expand`].
///
/// # Example
///
/// ```
/// use torsion_sym::kdf::{hkdf, Sha256};
///
/// let mut okm = [0u8; 42];
/// hkdf::derive::<Sha256>(&[0x0b; 22], b"salt", b"context", &mut okm).unwrap();
/// ```
pub fn derive<H: Hash>(ikm: &[u8], salt: &[u8], info: &[u8], out: &mut [u8]) -> Result<(), Error> {
    let mut prk = extract::<H>(ikm, salt)?.into_inner();
    let res = expand::<H>(prk.as_ref(), info, out);
    prk.zeroize();
    res
}
