//! The `ChaCha20-Poly1305` AEAD (RFC 8439 §2.8)
//!
//! The context moves one way through its phases:
//!
//! ```text
//! Aad --> Encrypt | Decrypt | Auth --> Done
//! ```
//!
//! AAD may only be absorbed before any message bytes, and a context only ever processes one
//! direction. Anything out of order is an `InvalidState` error and leaves the context as it
//! was. [`init`](ChaCha20Poly1305::init) starts over with a new key and nonce.

use zeroize::Zeroize;
use crate::chacha::{ChaCha20, GenericKey};
use crate::mac::Poly1305;
use crate::aead::Tag;
use crate::error::Error;
use crate::ct;

pub mod io;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    Aad,
    Encrypt,
    Decrypt,
    Auth,
    Done
}

/// The `ChaCha20-Poly1305` Authenticated Encryption with Associated Data (AEAD).
///
/// Accepts every `ChaCha20` nonce size, a 24 byte nonce gives `XChaCha20-Poly1305`.
///
/// # Example
///
/// ```
/// use torsion_sym::aead::ChaCha20Poly1305;
///
/// let key = [7u8; 32];
/// let nonce = [3u8; 12];
///
/// let mut ctx = ChaCha20Poly1305::new(&key, &nonce).unwrap();
/// ctx.aad(b"header").unwrap();
///
/// let mut sealed = [0u8; 11];
/// ctx.encrypt(b"hello world", &mut sealed).unwrap();
/// let tag = ctx.finalize().unwrap();
///
/// let mut ctx = ChaCha20Poly1305::new(&key, &nonce).unwrap();
/// ctx.aad(b"header").unwrap();
///
/// let mut opened = [0u8; 11];
/// ctx.decrypt(&sealed, &mut opened).unwrap();
///
/// assert!(ChaCha20Poly1305::verify(&ctx.finalize().unwrap(), tag.as_slice()));
/// assert_eq!(&opened, b"hello world");
/// ```
pub struct ChaCha20Poly1305 {
    chacha: ChaCha20,
    poly: Poly1305,
    aad_len: u64,
    ct_len: u64,
    phase: Phase
}

opaque_dbg! { ChaCha20Poly1305 }

impl ChaCha20Poly1305 {
    /// Create a new context, deriving the one-time `Poly1305` key from the first keystream
    /// block.
    ///
    /// # Errors
    ///
    /// `InvalidContext` if the nonce is not one of the [`chacha::NONCE_SIZES`].
    ///
    /// [`chacha::NONCE_SIZES`]: crate::chacha::NONCE_SIZES
    pub fn new<K: GenericKey>(key: K, nonce: &[u8]) -> Result<Self, Error> {
        let mut chacha = ChaCha20::new(key, nonce, 0)?;

        let mut poly_key = [0u8; 32];
        chacha.apply_keystream(&mut poly_key);
        chacha.pad();

        let poly = Poly1305::new(&poly_key);
        poly_key.zeroize();

        Ok(Self { chacha, poly, aad_len: 0, ct_len: 0, phase: Phase::Aad })
    }

    /// Reset the context for a new key and nonce.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new), on failure the previous state is left untouched.
    pub fn init<K: GenericKey>(&mut self, key: K, nonce: &[u8]) -> Result<(), Error> {
        *self = Self::new(key, nonce)?;
        Ok(())
    }

    /// Absorb additional authenticated data.
    ///
    /// # Errors
    ///
    /// `InvalidState` once any message bytes were processed or after finalization.
    pub fn aad(&mut self, data: &[u8]) -> Result<(), Error> {
        ensure!(self.phase == Phase::Aad, InvalidState, phase = ?self.phase, "aead aad out of order");

        self.poly.update(data);
        self.aad_len = self.aad_len.wrapping_add(data.len() as u64);
        Ok(())
    }

    #[inline]
    fn enter(&mut self, phase: Phase) -> Result<(), Error> {
        if self.phase == Phase::Aad {
            self.poly.pad();
            self.phase = phase;
            return Ok(());
        }

        ensure!(
            self.phase == phase,
            InvalidState, phase = ?self.phase, requested = ?phase, "aead direction change"
        );

        Ok(())
    }

    #[inline]
    fn count(&mut self, len: usize) {
        self.ct_len = self.ct_len.wrapping_add(len as u64);
    }

    /// Encrypt `input` into the front of `output`, authenticating the ciphertext.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the context is decrypting, authenticating or finalized.
    /// - `InvalidLength` if `output` is shorter than `input`.
    pub fn encrypt(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
        ensure!(output.len() >= input.len(), InvalidLength, "aead output too short");
        self.enter(Phase::Encrypt)?;

        let out = &mut output[..input.len()];
        out.copy_from_slice(input);
        self.chacha.apply_keystream(out);
        self.poly.update(out);
        self.count(input.len());
        Ok(())
    }

    /// Encrypt `data` in place.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the context is decrypting, authenticating or finalized.
    pub fn encrypt_in_place(&mut self, data: &mut [u8]) -> Result<(), Error> {
        self.enter(Phase::Encrypt)?;

        self.chacha.apply_keystream(data);
        self.poly.update(data);
        self.count(data.len());
        Ok(())
    }

    /// Authenticate then decrypt `input` into the front of `output`.
    ///
    /// The plaintext must not be trusted until the [`finalize`](Self::finalize) tag verifies.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the context is encrypting, authenticating or finalized.
    /// - `InvalidLength` if `output` is shorter than `input`.
    pub fn decrypt(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
        ensure!(output.len() >= input.len(), InvalidLength, "aead output too short");
        self.enter(Phase::Decrypt)?;

        self.poly.update(input);
        let out = &mut output[..input.len()];
        out.copy_from_slice(input);
        self.chacha.apply_keystream(out);
        self.count(input.len());
        Ok(())
    }

    /// Decrypt `data` in place.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the context is encrypting, authenticating or finalized.
    pub fn decrypt_in_place(&mut self, data: &mut [u8]) -> Result<(), Error> {
        self.enter(Phase::Decrypt)?;

        self.poly.update(data);
        self.chacha.apply_keystream(data);
        self.count(data.len());
        Ok(())
    }

    /// Authenticate ciphertext without decrypting it.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the context is encrypting, decrypting or finalized.
    pub fn auth(&mut self, data: &[u8]) -> Result<(), Error> {
        self.enter(Phase::Auth)?;

        self.poly.update(data);
        self.count(data.len());
        Ok(())
    }

    /// Pad, absorb the AAD and ciphertext lengths, and produce the tag.
    ///
    /// The keystream is wiped, further calls fail until [`init`](Self::init).
    ///
    /// # Errors
    ///
    /// `InvalidState` if the context was already finalized.
    pub fn finalize(&mut self) -> Result<Tag, Error> {
        ensure!(self.phase != Phase::Done, InvalidState, "aead finalized twice");

        // a context with no message still pads its aad
        self.poly.pad();

        let mut lengths = [0u8; 16];
        lengths[..8].copy_from_slice(&self.aad_len.to_le_bytes());
        lengths[8..].copy_from_slice(&self.ct_len.to_le_bytes());
        self.poly.update(&lengths);

        let poly = core::mem::replace(&mut self.poly, Poly1305::new(&[0u8; 32]));
        self.chacha.zeroize();
        self.phase = Phase::Done;

        Ok(poly.finalize())
    }

    /// Constant time comparison of a computed tag against a received one.
    #[inline]
    pub fn verify(tag: &Tag, expected: &[u8]) -> bool {
        ct::ct_eq(tag, expected)
    }
}

impl Zeroize for ChaCha20Poly1305 {
    fn zeroize(&mut self) {
        self.chacha.zeroize();
        self.poly.zeroize();
        self.aad_len = 0;
        self.ct_len = 0;
        self.phase = Phase::Done;
    }
}

/// One-shot encryption of `in_out` in place, returning the tag.
///
/// # Errors
///
/// `InvalidContext` if the nonce size is not supported.
pub fn encrypt_in_place<K: GenericKey>(
    key: K, nonce: &[u8],
    in_out: &mut [u8], aad: &[u8]
) -> Result<Tag, Error> {
    let mut ctx = ChaCha20Poly1305::new(key, nonce)?;
    ctx.aad(aad)?;
    ctx.encrypt_in_place(in_out)?;
    ctx.finalize()
}

/// One-shot decryption of `in_out` in place.
///
/// # Errors
///
/// - `InvalidContext` if the nonce size is not supported.
/// - `TagMismatch` if `tag` does not authenticate the ciphertext, `in_out` is zeroed.
pub fn decrypt_in_place<K: GenericKey>(
    key: K, nonce: &[u8],
    in_out: &mut [u8], aad: &[u8],
    tag: &[u8]
) -> Result<(), Error> {
    let mut ctx = ChaCha20Poly1305::new(key, nonce)?;
    ctx.aad(aad)?;
    ctx.decrypt_in_place(in_out)?;

    if ChaCha20Poly1305::verify(&ctx.finalize()?, tag) {
        Ok(())
    } else {
        in_out.zeroize();
        bail!(TagMismatch, "chacha20-poly1305 tag mismatch")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use hex_literal::hex;

    const KEY: [u8; 32] = hex!("808182838485868788898a8b8c8d8e8f909192939495969798999a9b9c9d9e9f");
    const NONCE: [u8; 12] = hex!("070000004041424344454647");
    const AAD: [u8; 12] = hex!("50515253c0c1c2c3c4c5c6c7");
    const PLAIN: &[u8] = b"Ladies and Gentlemen of the class of '99: If I could offer you \
        only one tip for the future, sunscreen would be it.";

    #[test]
    fn rfc8439_2_8_2() {
        let mut buf = PLAIN.to_vec();
        let tag = encrypt_in_place(&KEY, &NONCE, &mut buf, &AAD).unwrap();

        assert_eq!(&buf[..16], hex!("d31a8d34648e60db7b86afbc53ef7ec2"));
        assert_eq!(tag.take(), hex!("1ae10b594f09e26a7e902ecbd0600691"));

        decrypt_in_place(&KEY, &NONCE, &mut buf, &AAD, tag.as_slice()).unwrap();
        assert_eq!(buf, PLAIN);
    }

    #[test]
    fn tamper_zeroes_output() {
        let mut buf = PLAIN.to_vec();
        let tag = encrypt_in_place(&KEY, &NONCE, &mut buf, &AAD).unwrap();
        buf[3] ^= 0x10;

        assert_eq!(
            decrypt_in_place(&KEY, &NONCE, &mut buf, &AAD, tag.as_slice()).unwrap_err().kind(),
            ErrorKind::TagMismatch
        );
        assert!(buf.iter().all(|b| *b == 0));
    }

    #[test]
    fn auth_matches_decrypt() {
        let mut buf = PLAIN.to_vec();
        let tag = encrypt_in_place(&KEY, &NONCE, &mut buf, &AAD).unwrap();

        let mut ctx = ChaCha20Poly1305::new(&KEY, &NONCE).unwrap();
        ctx.aad(&AAD).unwrap();
        ctx.auth(&buf).unwrap();

        assert_eq!(ctx.finalize().unwrap(), tag);
    }

    #[test]
    fn aad_after_message() {
        let mut ctx = ChaCha20Poly1305::new(&KEY, &NONCE).unwrap();
        let mut out = [0u8; 4];
        ctx.encrypt(b"abcd", &mut out).unwrap();

        assert_eq!(ctx.aad(b"late").unwrap_err().kind(), ErrorKind::InvalidState);

        // the context is still usable
        ctx.encrypt(b"efgh", &mut out).unwrap();
        assert!(ctx.finalize().is_ok());
    }

    #[test]
    fn direction_is_fixed() {
        let mut ctx = ChaCha20Poly1305::new(&KEY, &NONCE).unwrap();
        let mut out = [0u8; 4];
        ctx.decrypt(b"abcd", &mut out).unwrap();

        assert_eq!(ctx.encrypt(b"abcd", &mut out).unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(ctx.auth(b"abcd").unwrap_err().kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn nothing_after_finalize() {
        let mut ctx = ChaCha20Poly1305::new(&KEY, &NONCE).unwrap();
        let _ = ctx.finalize().unwrap();

        let mut out = [0u8; 1];
        assert_eq!(ctx.finalize().unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(ctx.aad(b"a").unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(ctx.encrypt(b"a", &mut out).unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(ctx.decrypt(b"a", &mut out).unwrap_err().kind(), ErrorKind::InvalidState);

        ctx.init(&KEY, &NONCE).unwrap();
        assert!(ctx.finalize().is_ok());
    }

    #[test]
    fn output_length_checked() {
        let mut ctx = ChaCha20Poly1305::new(&KEY, &NONCE).unwrap();
        let mut out = [0u8; 3];
        assert_eq!(ctx.encrypt(b"abcd", &mut out).unwrap_err().kind(), ErrorKind::InvalidLength);
        // rejected before entering a direction
        ctx.aad(b"still fine").unwrap();
    }

    #[test]
    fn bad_nonce() {
        assert_eq!(
            ChaCha20Poly1305::new(&KEY, &[0u8; 10]).unwrap_err().kind(),
            ErrorKind::InvalidContext
        );

        let mut ctx = ChaCha20Poly1305::new(&KEY, &NONCE).unwrap();
        ctx.aad(b"kept").unwrap();
        assert!(ctx.init(&KEY, &[0u8; 10]).is_err());
        ctx.aad(b"still kept").unwrap();
    }
}
