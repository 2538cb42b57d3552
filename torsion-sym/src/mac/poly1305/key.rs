//! Key types for the `Poly1305` MAC.
//!
//! - `Key`: an owned 32 byte one-time key, zeroized on drop.
//! - `KeyRef`: a borrowed key, for callers that manage the key memory themselves.

use zeroize::Zeroize;
use crate::sealed::Sealed;
use crate::error::Error;

/// The size of the Poly1305 key in bytes.
pub const KEY_SIZE: usize = 32;

/// A sealed trait for the key types accepted by [`Poly1305::new`](super::Poly1305::new).
pub trait GenericKey : Sealed {
    #[doc(hidden)]
    fn bytes(&self) -> &[u8; KEY_SIZE];
}

/// Represents a 32-byte secret key for `Poly1305` and `ChaCha20Poly1305`.
#[repr(transparent)]
#[derive(Clone)]
pub struct Key {
    inner: [u8; KEY_SIZE]
}

impl Key {
    /// Creates a new `Key` from a 32-byte array.
    pub const fn new(inner: [u8; KEY_SIZE]) -> Self {
        Self { inner }
    }

    /// Borrows the key as a [`KeyRef`].
    pub const fn as_ref(&self) -> KeyRef {
        KeyRef::new(&self.inner)
    }
}

impl Zeroize for Key {
    #[inline]
    fn zeroize(&mut self) {
        self.inner.zeroize();
    }
}

opaque_dbg! { Key }
impl Sealed for Key {}
impl GenericKey for Key {
    #[inline]
    fn bytes(&self) -> &[u8; KEY_SIZE] {
        &self.inner
    }
}

impl From<[u8; KEY_SIZE]> for Key {
    #[inline]
    fn from(value: [u8; KEY_SIZE]) -> Self {
        Self::new(value)
    }
}

impl Drop for Key {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// A reference to key material owned elsewhere.
#[repr(transparent)]
pub struct KeyRef<'r> {
    inner: &'r [u8; KEY_SIZE]
}

impl<'r> KeyRef<'r> {
    pub const fn new(inner: &'r [u8; KEY_SIZE]) -> Self {
        Self { inner }
    }

    /// Copies the key material into an owned [`Key`].
    pub const fn copy(&self) -> Key {
        Key::new(*self.inner)
    }
}

opaque_dbg! { KeyRef<'r> }

impl<'r> Sealed for KeyRef<'r> {}
impl<'r> GenericKey for KeyRef<'r> {
    #[inline]
    fn bytes(&self) -> &[u8; KEY_SIZE] {
        self.inner
    }
}

// `Sealed` for `&[u8; 32]` is already provided in `chacha::key` (shared marker trait).
impl<'r> GenericKey for &'r [u8; KEY_SIZE] {
    #[inline]
    fn bytes(&self) -> &[u8; KEY_SIZE] {
        self
    }
}

impl<'r> From<&'r [u8; KEY_SIZE]> for KeyRef<'r> {
    #[inline]
    fn from(value: &'r [u8; KEY_SIZE]) -> Self {
        Self::new(value)
    }
}

impl<'r> TryFrom<&'r [u8]> for KeyRef<'r> {
    type Error = Error;

    /// # Errors
    ///
    /// `InvalidKeySize` if the slice is not exactly 32 bytes.
    #[inline]
    fn try_from(value: &'r [u8]) -> Result<Self, Self::Error> {
        match value.try_into() {
            Ok(inner) => Ok(Self::new(inner)),
            Err(_) => bail!(InvalidKeySize, key_len = value.len(), "poly1305 key must be 32 bytes")
        }
    }
}
