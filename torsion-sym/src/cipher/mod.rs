//! Generic Block Cipher Dispatch
//!
//! [`CipherKind`] enumerates the 24 supported block ciphers with their legacy integer ids,
//! [`Cipher`] is an initialized key schedule for one of them. The active variant is chosen once,
//! at construction, every block operation afterwards is a single match.
//!
//! AES and IDEA are implemented here, the remaining legacy ciphers are driven through their
//! RustCrypto implementations with zeroize-on-drop enabled.

pub mod aes;
pub mod idea;

non_fips! {
    pub mod rc4;
}

alloc! {
    pub use crate::stream::{static_encrypt, static_decrypt};
}

use ::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use ::cipher::generic_array::GenericArray;
use core::fmt;
use crate::buf::MAX_BLOCK_SIZE;
use crate::error::Error;

/// A block cipher identifier.
///
/// The discriminants are the legacy integer ids, stable for serialized configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum CipherKind {
    Aes128 = 0,
    Aes192 = 1,
    Aes256 = 2,
    Blowfish = 3,
    Camellia128 = 4,
    Camellia192 = 5,
    Camellia256 = 6,
    Cast5 = 7,
    Des = 8,
    DesEde = 9,
    DesEde3 = 10,
    Idea = 11,
    Rc2 = 12,
    Rc2Gutmann = 13,
    Rc2_40 = 14,
    Rc2_64 = 15,
    Rc2_128 = 16,
    Rc2_128Gutmann = 17,
    Serpent128 = 18,
    Serpent192 = 19,
    Serpent256 = 20,
    Twofish128 = 21,
    Twofish192 = 22,
    Twofish256 = 23,
}

const ALL_KINDS: [CipherKind; 24] = [
    CipherKind::Aes128,
    CipherKind::Aes192,
    CipherKind::Aes256,
    CipherKind::Blowfish,
    CipherKind::Camellia128,
    CipherKind::Camellia192,
    CipherKind::Camellia256,
    CipherKind::Cast5,
    CipherKind::Des,
    CipherKind::DesEde,
    CipherKind::DesEde3,
    CipherKind::Idea,
    CipherKind::Rc2,
    CipherKind::Rc2Gutmann,
    CipherKind::Rc2_40,
    CipherKind::Rc2_64,
    CipherKind::Rc2_128,
    CipherKind::Rc2_128Gutmann,
    CipherKind::Serpent128,
    CipherKind::Serpent192,
    CipherKind::Serpent256,
    CipherKind::Twofish128,
    CipherKind::Twofish192,
    CipherKind::Twofish256,
];

impl CipherKind {
    /// The largest cipher id.
    pub const MAX: Self = Self::Twofish256;

    /// Every cipher kind, in id order.
    pub const fn all() -> &'static [Self; 24] {
        &ALL_KINDS
    }

    /// The default key size in bytes.
    pub const fn key_size(self) -> usize {
        match self {
            Self::Aes128 | Self::Camellia128 | Self::Serpent128 | Self::Twofish128 => 16,
            Self::Aes192 | Self::Camellia192 | Self::Serpent192 | Self::Twofish192 => 24,
            Self::Aes256 | Self::Camellia256 | Self::Serpent256 | Self::Twofish256 => 32,
            Self::Blowfish | Self::Cast5 | Self::Idea | Self::DesEde => 16,
            Self::Des | Self::Rc2 | Self::Rc2Gutmann | Self::Rc2_64 => 8,
            Self::DesEde3 => 24,
            Self::Rc2_40 => 5,
            Self::Rc2_128 | Self::Rc2_128Gutmann => 16,
        }
    }

    /// The block size in bytes, 16 or 8.
    pub const fn block_size(self) -> usize {
        match self {
            Self::Aes128 | Self::Aes192 | Self::Aes256
            | Self::Camellia128 | Self::Camellia192 | Self::Camellia256
            | Self::Serpent128 | Self::Serpent192 | Self::Serpent256
            | Self::Twofish128 | Self::Twofish192 | Self::Twofish256 => 16,
            _ => 8
        }
    }

    /// Whether `len` is an acceptable key length for this cipher.
    pub const fn accepts_key_len(self, len: usize) -> bool {
        match self {
            Self::Blowfish => len >= 1 && len <= 72,
            Self::Rc2 | Self::Rc2Gutmann => len >= 1 && len <= 128,
            _ => len == self.key_size()
        }
    }

    /// Whether the kind is the only one usable without `allow-non-fips`.
    pub const fn is_aes(self) -> bool {
        matches!(self, Self::Aes128 | Self::Aes192 | Self::Aes256)
    }

    /// The canonical name, for diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Aes128 => "AES-128",
            Self::Aes192 => "AES-192",
            Self::Aes256 => "AES-256",
            Self::Blowfish => "BF",
            Self::Camellia128 => "CAMELLIA-128",
            Self::Camellia192 => "CAMELLIA-192",
            Self::Camellia256 => "CAMELLIA-256",
            Self::Cast5 => "CAST5",
            Self::Des => "DES",
            Self::DesEde => "DES-EDE",
            Self::DesEde3 => "DES-EDE3",
            Self::Idea => "IDEA",
            Self::Rc2 => "RC2",
            Self::Rc2Gutmann => "RC2-GUTMANN",
            Self::Rc2_40 => "RC2-40",
            Self::Rc2_64 => "RC2-64",
            Self::Rc2_128 => "RC2-128",
            Self::Rc2_128Gutmann => "RC2-128-GUTMANN",
            Self::Serpent128 => "SERPENT-128",
            Self::Serpent192 => "SERPENT-192",
            Self::Serpent256 => "SERPENT-256",
            Self::Twofish128 => "TWOFISH-128",
            Self::Twofish192 => "TWOFISH-192",
            Self::Twofish256 => "TWOFISH-256",
        }
    }

    /// Looks a kind up by its [`name`](Self::name), ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_KINDS.iter().copied().find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

impl TryFrom<u32> for CipherKind {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match ALL_KINDS.get(value as usize) {
            Some(kind) => Ok(*kind),
            None => bail!(InvalidContext, id = value, "unknown cipher id")
        }
    }
}

impl From<CipherKind> for u32 {
    #[inline]
    fn from(value: CipherKind) -> Self {
        value as Self
    }
}

impl fmt::Display for CipherKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

enum Inner {
    Aes(aes::Aes),
    Blowfish(blowfish::Blowfish),
    Camellia128(camellia::Camellia128),
    Camellia192(camellia::Camellia192),
    Camellia256(camellia::Camellia256),
    Cast5(cast5::Cast5),
    Des(des::Des),
    DesEde(des::TdesEde2),
    DesEde3(des::TdesEde3),
    Idea(idea::Idea),
    Rc2(rc2::Rc2),
    Serpent(serpent::Serpent),
    Twofish(twofish::Twofish),
}

// the crate backends only signal `InvalidLength`, surfaced here as a key size error.
#[inline]
fn backend<C: KeyInit>(kind: CipherKind, key: &[u8]) -> Result<C, Error> {
    match C::new_from_slice(key) {
        Ok(c) => Ok(c),
        Err(_) => bail!(InvalidKeySize, cipher = kind.name(), key_len = key.len(), "backend rejected key")
    }
}

/// An initialized block cipher.
///
/// Every backend zeroes its key schedule when dropped.
pub struct Cipher {
    kind: CipherKind,
    inner: Inner
}

opaque_dbg! { Cipher }

impl Cipher {
    /// Expands `key` for the cipher `kind`.
    ///
    /// # Errors
    ///
    /// - `InvalidKeySize` if `key` is not an accepted length for `kind`.
    /// - `InvalidContext` if `kind` is not AES and the `allow-non-fips` feature is off.
    pub fn new(kind: CipherKind, key: &[u8]) -> Result<Self, Error> {
        ensure!(
            kind.accepts_key_len(key.len()),
            InvalidKeySize, cipher = kind.name(), key_len = key.len(), "cipher key rejected"
        );

        #[cfg(not(feature = "allow-non-fips"))]
        ensure!(kind.is_aes(), InvalidContext, cipher = kind.name(), "non-fips cipher disabled");

        let inner = match kind {
            CipherKind::Aes128 | CipherKind::Aes192 | CipherKind::Aes256 => {
                Inner::Aes(aes::Aes::new(key)?)
            },
            CipherKind::Blowfish => {
                // the bcrypt schedule takes any length up to the full 72 bytes of P.
                let mut bf = blowfish::Blowfish::bc_init_state();
                bf.bc_expand_key(key);
                Inner::Blowfish(bf)
            },
            CipherKind::Camellia128 => Inner::Camellia128(backend(kind, key)?),
            CipherKind::Camellia192 => Inner::Camellia192(backend(kind, key)?),
            CipherKind::Camellia256 => Inner::Camellia256(backend(kind, key)?),
            CipherKind::Cast5 => Inner::Cast5(backend(kind, key)?),
            CipherKind::Des => Inner::Des(backend(kind, key)?),
            CipherKind::DesEde => Inner::DesEde(backend(kind, key)?),
            CipherKind::DesEde3 => Inner::DesEde3(backend(kind, key)?),
            CipherKind::Idea => Inner::Idea(idea::Idea::new(key)?),
            CipherKind::Rc2 | CipherKind::Rc2_40 | CipherKind::Rc2_64 | CipherKind::Rc2_128 => {
                Inner::Rc2(rc2::Rc2::new_with_eff_key_len(key, key.len() * 8))
            },
            CipherKind::Rc2Gutmann | CipherKind::Rc2_128Gutmann => {
                Inner::Rc2(rc2::Rc2::new_with_eff_key_len(key, 1024))
            },
            CipherKind::Serpent128 | CipherKind::Serpent192 | CipherKind::Serpent256 => {
                Inner::Serpent(backend(kind, key)?)
            },
            CipherKind::Twofish128 | CipherKind::Twofish192 | CipherKind::Twofish256 => {
                Inner::Twofish(backend(kind, key)?)
            },
        };

        Ok(Self { kind, inner })
    }

    /// The kind this cipher was created as.
    #[inline]
    pub const fn kind(&self) -> CipherKind {
        self.kind
    }

    /// The block size in bytes.
    #[inline]
    pub const fn block_size(&self) -> usize {
        self.kind.block_size()
    }

    /// Encrypts exactly one block in place.
    ///
    /// # Errors
    ///
    /// If `block` is not exactly [`block_size`](Self::block_size) bytes.
    pub fn encrypt_block(&self, block: &mut [u8]) -> Result<(), Error> {
        ensure!(block.len() == self.block_size(), InvalidLength, len = block.len(), "not one block");
        self.encrypt_unchecked(block);
        Ok(())
    }

    /// Decrypts exactly one block in place.
    ///
    /// # Errors
    ///
    /// If `block` is not exactly [`block_size`](Self::block_size) bytes.
    pub fn decrypt_block(&self, block: &mut [u8]) -> Result<(), Error> {
        ensure!(block.len() == self.block_size(), InvalidLength, len = block.len(), "not one block");
        self.decrypt_unchecked(block);
        Ok(())
    }

    /// Encrypts `src` into `dst`, both exactly one block.
    ///
    /// # Errors
    ///
    /// If either buffer is not exactly one block.
    pub fn encrypt(&self, src: &[u8], dst: &mut [u8]) -> Result<(), Error> {
        ensure!(src.len() == self.block_size(), InvalidLength, len = src.len(), "not one block");
        ensure!(dst.len() == src.len(), InvalidLength, len = dst.len(), "not one block");
        dst.copy_from_slice(src);
        self.encrypt_unchecked(dst);
        Ok(())
    }

    /// Decrypts `src` into `dst`, both exactly one block.
    ///
    /// # Errors
    ///
    /// If either buffer is not exactly one block.
    pub fn decrypt(&self, src: &[u8], dst: &mut [u8]) -> Result<(), Error> {
        ensure!(src.len() == self.block_size(), InvalidLength, len = src.len(), "not one block");
        ensure!(dst.len() == src.len(), InvalidLength, len = dst.len(), "not one block");
        dst.copy_from_slice(src);
        self.decrypt_unchecked(dst);
        Ok(())
    }

    /// Encrypts the first `block_size` bytes of a scratch block.
    #[inline]
    pub(crate) fn encrypt_scratch(&self, block: &mut [u8; MAX_BLOCK_SIZE]) {
        let bs = self.block_size();
        self.encrypt_unchecked(&mut block[..bs]);
    }

    /// Decrypts the first `block_size` bytes of a scratch block.
    #[inline]
    pub(crate) fn decrypt_scratch(&self, block: &mut [u8; MAX_BLOCK_SIZE]) {
        let bs = self.block_size();
        self.decrypt_unchecked(&mut block[..bs]);
    }

    pub(crate) fn encrypt_unchecked(&self, block: &mut [u8]) {
        debug_assert_eq!(block.len(), self.block_size());

        match &self.inner {
            Inner::Aes(c) => {
                if let Ok(b) = <&mut [u8; 16]>::try_from(block) {
                    c.encrypt_block(b);
                }
            },
            Inner::Idea(c) => {
                if let Ok(b) = <&mut [u8; 8]>::try_from(block) {
                    c.encrypt_block(b);
                }
            },
            Inner::Blowfish(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Inner::Camellia128(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Inner::Camellia192(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Inner::Camellia256(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Inner::Cast5(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Inner::Des(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Inner::DesEde(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Inner::DesEde3(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Inner::Rc2(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Inner::Serpent(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Inner::Twofish(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
        }
    }

    pub(crate) fn decrypt_unchecked(&self, block: &mut [u8]) {
        debug_assert_eq!(block.len(), self.block_size());

        match &self.inner {
            Inner::Aes(c) => {
                if let Ok(b) = <&mut [u8; 16]>::try_from(block) {
                    c.decrypt_block(b);
                }
            },
            Inner::Idea(c) => {
                if let Ok(b) = <&mut [u8; 8]>::try_from(block) {
                    c.decrypt_block(b);
                }
            },
            Inner::Blowfish(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Inner::Camellia128(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Inner::Camellia192(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Inner::Camellia256(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Inner::Cast5(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Inner::Des(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Inner::DesEde(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Inner::DesEde3(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Inner::Rc2(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Inner::Serpent(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Inner::Twofish(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
        }
    }
}
