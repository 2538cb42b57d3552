//! One-shot encryption and decryption over [`CipherStream`].
//!
//! The AEAD modes carry their tag after the ciphertext, 16 bytes (one block for EAX over an
//! 8 byte block cipher), with no associated data. CCM declares the input length as the message
//! length.

use zeroize::Zeroize;
use crate::cipher::CipherKind;
use crate::error::Error;
use super::{CipherStream, Direction, Mode, MAX_FINAL_SIZE, MAX_TAG_SIZE, max_update_size};

/// An output length sufficient for a one-shot operation over `len` bytes in any mode.
#[inline]
pub const fn static_output_size(len: usize) -> usize {
    max_update_size(len) + MAX_FINAL_SIZE + MAX_TAG_SIZE
}

#[inline]
const fn tag_size(kind: CipherKind, mode: Mode) -> usize {
    match mode {
        Mode::Eax => kind.block_size(),
        Mode::Gcm | Mode::Ccm => MAX_TAG_SIZE,
        _ => 0
    }
}

/// Encrypts `input` into `output`, returning the number of bytes written.
///
/// # Errors
///
/// - `InvalidContext` if the key or IV is rejected, see [`CipherStream::new`].
/// - `InvalidLength` if `output` is too short (see [`static_output_size`]) or the input cannot
///   be completed without padding.
pub fn static_encrypt_into(
    kind: CipherKind,
    mode: Mode,
    key: &[u8],
    iv: &[u8],
    input: &[u8],
    output: &mut [u8]
) -> Result<usize, Error> {
    let mut stream = CipherStream::new(kind, mode, Direction::Encrypt, key, iv)?;

    if mode == Mode::Ccm {
        stream.set_ccm(input.len() as u64, MAX_TAG_SIZE, &[])?;
    }

    let mut len = stream.update(input, output)?;
    len += stream.finalize(&mut output[len..])?;

    if mode.is_aead() {
        let tag = stream.get_tag()?;
        ensure!(output.len() - len >= tag.len(), InvalidLength, "no room for the tag");
        output[len..len + tag.len()].copy_from_slice(tag);
        len += tag.len();
    }

    Ok(len)
}

/// Decrypts `input` into `output`, returning the number of bytes written.
///
/// For the AEAD modes the trailing tag is verified, on failure `output` is cleared.
///
/// # Errors
///
/// - `InvalidContext` if the key or IV is rejected.
/// - `InvalidLength` if `output` is too short, or `input` is shorter than the tag or cannot be
///   completed.
/// - `PaddingError` if the PKCS#7 padding is malformed.
/// - `TagMismatch` if the tag does not verify.
pub fn static_decrypt_into(
    kind: CipherKind,
    mode: Mode,
    key: &[u8],
    iv: &[u8],
    input: &[u8],
    output: &mut [u8]
) -> Result<usize, Error> {
    let tag_len = tag_size(kind, mode);
    ensure!(input.len() >= tag_len, InvalidLength, len = input.len(), "input shorter than the tag");

    let (body, tag) = input.split_at(input.len() - tag_len);
    let mut stream = CipherStream::new(kind, mode, Direction::Decrypt, key, iv)?;

    if mode == Mode::Ccm {
        stream.set_ccm(body.len() as u64, tag_len, &[])?;
    }

    if mode.is_aead() {
        stream.set_tag(tag)?;
    }

    let written = stream.update(body, output)?;

    match stream.finalize(&mut output[written..]) {
        Ok(n) => Ok(written + n),
        Err(err) => {
            output[..written].zeroize();
            Err(err)
        }
    }
}

alloc! {
    use alloc::vec::Vec;
    use alloc::vec;

    /// Encrypts `input`, returning the ciphertext with any AEAD tag appended.
    ///
    /// # Errors
    ///
    /// See [`static_encrypt_into`].
    pub fn static_encrypt(
        kind: CipherKind,
        mode: Mode,
        key: &[u8],
        iv: &[u8],
        input: &[u8]
    ) -> Result<Vec<u8>, Error> {
        let mut out = vec![0u8; static_output_size(input.len())];
        let len = static_encrypt_into(kind, mode, key, iv, input, &mut out)?;
        out.truncate(len);
        Ok(out)
    }

    /// Decrypts `input`, verifying and stripping any AEAD tag.
    ///
    /// # Errors
    ///
    /// See [`static_decrypt_into`].
    pub fn static_decrypt(
        kind: CipherKind,
        mode: Mode,
        key: &[u8],
        iv: &[u8],
        input: &[u8]
    ) -> Result<Vec<u8>, Error> {
        let mut out = vec![0u8; static_output_size(input.len())];

        match static_decrypt_into(kind, mode, key, iv, input, &mut out) {
            Ok(len) => {
                out[len..].zeroize();
                out.truncate(len);
                Ok(out)
            },
            Err(err) => {
                out.zeroize();
                Err(err)
            }
        }
    }
}
