//! Authenticated Encryption with Associated Data
//!
//! The block cipher AEAD modes (GCM, CCM, EAX) live behind [`CipherStream`](crate::CipherStream),
//! this module holds `ChaCha20-Poly1305` and the shared [`Tag`].

mod tag;
pub mod chacha20_poly1305;

pub use tag::Tag;

#[doc(inline)]
pub use chacha20_poly1305::ChaCha20Poly1305;
