use crate::sealed::Sealed;
use crate::error::Error;
use zeroize::Zeroize;
use core::fmt;

/// Key material accepted by the `ChaCha20` and `Salsa20` constructors, 128 or 256 bits.
///
/// Sealed, so every implementor is statically one of the two valid sizes.
pub trait GenericKey : Sealed {
    fn slice(&self) -> &[u8];
}

/// An owned `ChaCha20` / `Salsa20` key, zeroized on drop.
#[must_use]
pub enum Key {
    B128([u8; 16]),
    B256([u8; 32])
}

impl Key {
    #[inline]
    pub const fn new_128(key: [u8; 16]) -> Self {
        Self::B128(key)
    }

    #[inline]
    pub const fn new_256(key: [u8; 32]) -> Self {
        Self::B256(key)
    }

    /// The key length in bytes, 16 or 32.
    #[inline]
    pub const fn len(&self) -> usize {
        match self {
            Self::B256(_) => 32,
            Self::B128(_) => 16
        }
    }

    /// Returns a friendly identifier for the key, `"Key::128"` or `"Key::256"`.
    pub const fn ident(&self) -> &'static str {
        match self {
            Self::B256(_) => "Key::256",
            Self::B128(_) => "Key::128"
        }
    }

    #[inline]
    pub const fn as_slice(&self) -> &[u8] {
        match self {
            Self::B256(array) => array.as_slice(),
            Self::B128(array) => array.as_slice()
        }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Self::B256(array) => array.as_mut_slice(),
            Self::B128(array) => array.as_mut_slice()
        }
    }
}

impl fmt::Debug for Key {
    /// Writes the [`ident`](Key::ident), never the key.
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.ident())
    }
}

impl TryFrom<&[u8]> for Key {
    type Error = Error;

    /// # Errors
    ///
    /// `InvalidKeySize` unless `value` is 16 or 32 bytes.
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if let Ok(raw) = <[u8; 32]>::try_from(value) {
            Ok(Self::B256(raw))
        } else if let Ok(raw) = <[u8; 16]>::try_from(value) {
            Ok(Self::B128(raw))
        } else {
            bail!(InvalidKeySize, key_len = value.len(), "stream cipher key must be 16 or 32 bytes")
        }
    }
}

impl Zeroize for Key {
    #[inline]
    fn zeroize(&mut self) {
        self.as_mut_slice().zeroize();
    }
}

impl Drop for Key {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl From<[u8; 16]> for Key {
    #[inline]
    fn from(value: [u8; 16]) -> Self {
        Self::B128(value)
    }
}

impl From<[u8; 32]> for Key {
    #[inline]
    fn from(value: [u8; 32]) -> Self {
        Self::B256(value)
    }
}

impl Sealed for Key {}

impl GenericKey for Key {
    #[inline]
    fn slice(&self) -> &[u8] {
        self.as_slice()
    }
}

impl<'k> Sealed for &'k Key {}

impl<'k> GenericKey for &'k Key {
    #[inline]
    fn slice(&self) -> &[u8] {
        self.as_slice()
    }
}

impl<'k> Sealed for &'k [u8; 16] {}

impl<'k> GenericKey for &'k [u8; 16] {
    #[inline]
    fn slice(&self) -> &[u8] {
        self.as_slice()
    }
}

impl<'k> Sealed for &'k [u8; 32] {}

impl<'k> GenericKey for &'k [u8; 32] {
    #[inline]
    fn slice(&self) -> &[u8] {
        self.as_slice()
    }
}

/// Loads the eight key words, repeating a 128 bit key.
#[inline]
pub(crate) fn key_words<K: GenericKey>(key: &K) -> [u32; 8] {
    let raw = key.slice();
    let mut words = [0u32; 8];

    for (i, word) in words.iter_mut().enumerate() {
        let at = (i * 4) % raw.len();
        *word = u32::from_le_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
    }

    words
}

/// The `"expand 16-byte k"` / `"expand 32-byte k"` constants for the key length.
#[inline]
pub(crate) const fn constants(key_len: usize) -> [u32; 4] {
    if key_len == 32 {
        [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574]
    } else {
        [0x6170_7865, 0x3120_646e, 0x7962_2d36, 0x6b20_6574]
    }
}

#[inline(always)]
pub(crate) fn le_word(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
