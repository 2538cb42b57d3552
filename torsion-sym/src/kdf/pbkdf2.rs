//! The Password Based Key Derivation Function 2 (PBKDF2)

use zeroize::Zeroize;
use crate::error::Error;
use crate::kdf::{Iters, blocks};
use crate::mac::hmac::Hmac;
use crate::mac::hmac::algo::{Hash, Digest};

/// Derive `out_key.len()` bytes from `password` and `salt` with `PBKDF2-HMAC-H`.
///
/// Every parameter is checked before any work is done, an empty `out_key` succeeds immediately.
///
/// # Errors
///
/// `InvalidParameters` if the output would take more than `u32::MAX` blocks.
///
/// # Example
///
/// ```
/// use torsion_sym::kdf::{pbkdf2_into, Iters, Sha256};
///
/// let mut key = [0u8; 32];
/// pbkdf2_into::<Sha256>(b"password", b"salt", Iters::new(1).unwrap(), &mut key).unwrap();
///
/// assert_eq!(key[..4], [0x12, 0x0f, 0xb6, 0xcf]);
/// ```
pub fn pbkdf2_into<H: Hash>(
    password: &[u8],
    salt: &[u8],
    iters: Iters,
    out_key: &mut [u8]
) -> Result<(), Error> {
    let size = <H::Digest as Digest>::size();

    let count = match blocks(out_key.len(), size) {
        Some(count) if u32::try_from(count).is_ok() => count,
        _ => bail!(InvalidParameters, out_len = out_key.len(), "pbkdf2 output too long")
    };

    if count == 0 {
        return Ok(());
    }

    let pmac = Hmac::<H>::new(password)?;
    let mut smac = pmac.clone();
    smac.update(salt);

    let mut block = <H::Digest as Digest>::zeroes();
    let mut mac = <H::Digest as Digest>::zeroes();

    for (i, chunk) in out_key.chunks_mut(size).enumerate() {
        let mut hmac = smac.clone();
        hmac.update(&(i as u32 + 1).to_be_bytes());
        hmac.finalize_into(&mut block);

        mac = block;

        for _ in 1..iters.get() {
            let mut hmac = pmac.clone();
            hmac.update(mac.as_ref());
            hmac.finalize_into(&mut mac);

            for (b, m) in block.as_mut().iter_mut().zip(mac.as_ref()) {
                *b ^= *m;
            }
        }

        chunk.copy_from_slice(&block.as_ref()[..chunk.len()]);
    }

    block.zeroize();
    mac.zeroize();

    Ok(())
}

/// Derive a `KL` byte key, see [`pbkdf2_into`].
///
/// # Errors
///
/// See [`pbkdf2_into`].
pub fn pbkdf2<const KL: usize, H: Hash>(
    password: &[u8],
    salt: &[u8],
    iters: Iters
) -> Result<[u8; KL], Error> {
    let mut out = [0u8; KL];
    pbkdf2_into::<H>(password, salt, iters, &mut out)?;
    Ok(out)
}
