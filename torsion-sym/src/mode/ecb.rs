//! Electronic Codebook
//!
//! Stateless, each block is transformed independently. [`steal`] / [`unsteal`] handle a final
//! partial block by borrowing the tail of the previous ciphertext block.

use crate::cipher::Cipher;
use crate::error::Error;
use super::{ensure_aligned, stage};

/// Encrypts whole blocks in place.
///
/// # Errors
///
/// If `data` is not a multiple of the block size.
pub fn encrypt_in_place(cipher: &Cipher, data: &mut [u8]) -> Result<(), Error> {
    let bs = cipher.block_size();
    ensure_aligned(data.len(), bs)?;

    for block in data.chunks_exact_mut(bs) {
        cipher.encrypt_unchecked(block);
    }

    Ok(())
}

/// Decrypts whole blocks in place.
///
/// # Errors
///
/// If `data` is not a multiple of the block size.
pub fn decrypt_in_place(cipher: &Cipher, data: &mut [u8]) -> Result<(), Error> {
    let bs = cipher.block_size();
    ensure_aligned(data.len(), bs)?;

    for block in data.chunks_exact_mut(bs) {
        cipher.decrypt_unchecked(block);
    }

    Ok(())
}

/// Encrypts `input` into the front of `output`.
///
/// # Errors
///
/// If `input` is unaligned or `output` is shorter than `input`.
pub fn encrypt(cipher: &Cipher, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
    ensure_aligned(input.len(), cipher.block_size())?;
    encrypt_in_place(cipher, stage(input, output)?)
}

/// Decrypts `input` into the front of `output`.
///
/// # Errors
///
/// If `input` is unaligned or `output` is shorter than `input`.
pub fn decrypt(cipher: &Cipher, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
    ensure_aligned(input.len(), cipher.block_size())?;
    decrypt_in_place(cipher, stage(input, output)?)
}

#[inline]
pub(crate) fn check_steal(cipher: &Cipher, last: &[u8], partial: &[u8]) -> Result<(), Error> {
    let bs = cipher.block_size();
    ensure!(
        last.len() == bs && partial.len() < bs,
        InvalidLength, last = last.len(), partial = partial.len(), "bad stealing lengths"
    );
    Ok(())
}

/// Ciphertext stealing for the final partial block.
///
/// On entry `last` is the previous ciphertext block and `partial` the final plaintext bytes. On
/// return `last` holds the full output block and `partial` the truncated one, output in that
/// order.
///
/// # Errors
///
/// If `last` is not one block, or `partial` is not shorter than one block.
pub fn steal(cipher: &Cipher, last: &mut [u8], partial: &mut [u8]) -> Result<(), Error> {
    check_steal(cipher, last, partial)?;

    let d = partial.len();
    last[..d].swap_with_slice(partial);
    cipher.encrypt_unchecked(last);

    Ok(())
}

/// Reverses [`steal`].
///
/// `last` is the full ciphertext block and `partial` the truncated one, on return they hold the
/// penultimate plaintext block and the final partial plaintext.
///
/// # Errors
///
/// If `last` is not one block, or `partial` is not shorter than one block.
pub fn unsteal(cipher: &Cipher, last: &mut [u8], partial: &mut [u8]) -> Result<(), Error> {
    check_steal(cipher, last, partial)?;

    let d = partial.len();
    cipher.decrypt_unchecked(last);
    last[..d].swap_with_slice(partial);
    cipher.decrypt_unchecked(last);

    Ok(())
}
