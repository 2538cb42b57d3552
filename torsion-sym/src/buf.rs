//! Buffers for Keys, Blocks, and Generally Sensitive Bytes
use zeroize::Zeroize;
use core::fmt;

/// The largest block size of any supported block cipher.
pub const MAX_BLOCK_SIZE: usize = 16;

/// A block-sized scratch buffer, large enough for every supported cipher.
pub(crate) type Block = [u8; MAX_BLOCK_SIZE];

/// Error returned when the provided slice is not the expected length.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InvalidSize;

impl fmt::Display for InvalidSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InvalidSize")
    }
}

std! {
    impl std::error::Error for InvalidSize {}
}

impl From<InvalidSize> for crate::Error {
    #[inline]
    fn from(_value: InvalidSize) -> Self {
        Self::new(crate::ErrorKind::InvalidLength)
    }
}

/// XORs `src` into `dst`, up to the shorter of the two.
#[inline]
pub(crate) fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d ^= *s;
    }
}

/// Writes `a ^ b` into `dst`, up to the shortest of the three.
#[inline]
pub(crate) fn xor_into(dst: &mut [u8], a: &[u8], b: &[u8]) {
    for ((d, l), r) in dst.iter_mut().zip(a.iter()).zip(b.iter()) {
        *d = *l ^ *r;
    }
}

alloc! {
    use alloc::vec::Vec;
    use core::ops;

    /// A heap buffer which is zeroed when dropped.
    ///
    /// Every exit path, including early returns through `?` and unwinding, runs the destructor,
    /// so secrets held here never outlive their owner.
    pub struct SecretBuf {
        inner: Vec<u8>
    }

    impl SecretBuf {
        /// Allocates a zero-filled buffer of `len` bytes.
        ///
        /// # Errors
        ///
        /// If the allocation could not be satisfied.
        pub fn zeroed(len: usize) -> Result<Self, crate::Error> {
            let mut inner = Vec::new();

            if inner.try_reserve_exact(len).is_err() {
                bail!(InvalidParameters, len, "secret buffer allocation failed");
            }

            inner.resize(len, 0u8);
            Ok(Self { inner })
        }

        /// Takes ownership of `inner`, zeroing it on drop.
        #[inline]
        pub const fn from_vec(inner: Vec<u8>) -> Self {
            Self { inner }
        }

        /// Returns the length of the buffer.
        #[inline]
        pub fn len(&self) -> usize {
            self.inner.len()
        }

        /// Returns `true` if the buffer has a length of zero.
        #[inline]
        pub fn is_empty(&self) -> bool {
            self.inner.is_empty()
        }
    }

    impl ops::Deref for SecretBuf {
        type Target = [u8];

        #[inline]
        fn deref(&self) -> &Self::Target {
            self.inner.as_slice()
        }
    }

    impl ops::DerefMut for SecretBuf {
        #[inline]
        fn deref_mut(&mut self) -> &mut Self::Target {
            self.inner.as_mut_slice()
        }
    }

    impl Zeroize for SecretBuf {
        #[inline]
        fn zeroize(&mut self) {
            self.inner.zeroize();
        }
    }

    impl Drop for SecretBuf {
        #[inline]
        fn drop(&mut self) {
            self.zeroize();
        }
    }

    opaque_dbg! { SecretBuf }
}
