//! Symmetric primitives of the torsion core.
//!
//! - [`cipher`]: 24 block ciphers behind one [`Cipher`] dispatch, plus RC4.
//! - [`mode`]: ECB, CBC, XTS, CTR, CFB, OFB, GCM, CCM and EAX over any [`Cipher`].
//! - [`stream`]: the buffered [`CipherStream`] API with padding, stealing, and tags.
//! - `chacha`, `salsa`, [`mac`], and `aead`: ChaCha20, Salsa20, Poly1305, and
//!   ChaCha20-Poly1305.
//! - [`kdf`]: PBKDF2, HKDF, scrypt, bcrypt, EB2K and PGPDF.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(
    clippy::pedantic,
    clippy::nursery,
    clippy::all
)]
// word / byte conversions in the ciphers are all bounded by construction.
#![allow(clippy::cast_possible_truncation)]
// stupid lint IMO
#![allow(clippy::module_name_repetitions)]
// this devalues things which actually require the must-use attribute
#![allow(clippy::must_use_candidate)]
// round functions read far better with the published single letter names
#![allow(clippy::many_single_char_names)]
// I don't need a linter lecturing me on performance
#![allow(clippy::inline_always)]
// I am doing constant time bitwise hacks
#![allow(clippy::cast_sign_loss)]
// indexing into fixed size state arrays, the bounds are static.
#![allow(clippy::needless_range_loop)]

#[cfg(any(test, feature = "alloc"))]
extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

pub mod buf;
pub mod opaque_res;
pub mod ct;
mod sealed;
mod error;

#[cfg(test)]
pub(crate) mod test_utils;

pub mod cipher;
pub mod mode;
pub mod stream;

non_fips! { // unfortunate
    pub mod chacha;
    pub mod salsa;
    pub mod aead;
}

pub mod mac;
pub mod kdf;

pub use error::{Error, ErrorKind, Unspecified, MakeOpaque};
pub use cipher::{Cipher, CipherKind};
pub use stream::{CipherStream, Mode};

#[inline]
#[must_use]
pub(crate) const fn can_cast_u32(len: usize) -> bool {
    len <= (u32::MAX as usize)
}

#[inline]
#[must_use]
pub(crate) const fn to_u32(num: usize) -> Option<u32> {
    if can_cast_u32(num) {
        Some(num as u32)
    } else {
        None
    }
}
