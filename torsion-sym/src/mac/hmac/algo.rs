//! Collection of marker types which denote the hashing function.

use zeroize::Zeroize;
use ::digest::core_api::BlockSizeUser;

use crate::sealed::HashSealed as Sealed;

/// Represent the output digest of a hash function.
pub trait Digest : Sealed + AsRef<[u8]> + AsMut<[u8]> + Copy + Zeroize {
    #[doc(hidden)]
    #[must_use]
    fn zeroes() -> Self;
    /// Returns the size of the digest in bytes.
    #[must_use]
    fn size() -> usize;
}

/// The hashing algorithm used by `HMAC` and the hash based KDFs.
pub trait Hash : Sealed {
    #[doc(hidden)]
    type Core: ::digest::Digest + BlockSizeUser + Clone;

    /// The fixed size output of the hash function.
    type Digest: Digest;

    /// A friendly name, `"SHA256"` and so on.
    const NAME: &'static str;

    /// Hash the concatenation of `parts`.
    fn hash(parts: &[&[u8]]) -> Self::Digest {
        let mut core = <Self::Core as ::digest::Digest>::new();
        for part in parts {
            ::digest::Digest::update(&mut core, part);
        }
        finish::<Self>(core)
    }
}

/// Finalizes a raw hasher into the fixed size digest.
#[inline]
pub(crate) fn finish<H: Hash + ?Sized>(core: H::Core) -> H::Digest {
    let mut out = H::Digest::zeroes();
    out.as_mut().copy_from_slice(&::digest::Digest::finalize(core));
    out
}

macro_rules! make_digest {
    ($($sz:literal),* $(,)?) => {
        $(
            impl Sealed for [u8; $sz] {}
            impl Digest for [u8; $sz] {
                #[inline]
                fn zeroes() -> Self {
                    [0u8; $sz]
                }
                #[inline]
                fn size() -> usize {
                    $sz
                }
            }
        )*
    };
}

macro_rules! make_algo_type {
    ($((
        $(#[$meta:meta])*
        $name:ident,
        $sz:literal,
        $core:ty,
        $friendly:literal
    )),* $(,)?) => {
        $(
            $(#[$meta])*
            pub struct $name;
            impl Sealed for $name {}

            impl Hash for $name {
                type Core = $core;
                type Digest = [u8; $sz];

                const NAME: &'static str = $friendly;
            }
        )*
    };
}

make_digest! { 16, 20, 28, 32, 48, 64 }

#[cfg_attr(docsrs, doc(cfg(feature = "allow-non-fips")))]
#[cfg(feature = "allow-non-fips")]
make_algo_type! {
    (
        /// The `MD5` Hash Function.
        ///
        /// `MD5` should be [considered cryptographically broken and unsuitable for further use][1].
        /// It remains here for the legacy KDFs (EB2K, PGPDF) which are defined over it.
        ///
        /// [1]: https://www.kb.cert.org/vuls/id/836068
        Md5, 16, ::md5::Md5, "MD5"
    ),
    (
        /// The `SHA-1` Hash Function.
        ///
        /// Included for legacy interoperability only, it is cryptographically broken.
        Sha1, 20, ::sha1::Sha1, "SHA1"
    )
}

make_algo_type! {
    (
        /// The `SHA224` Hash Function.
        Sha224, 28, ::sha2::Sha224, "SHA224"
    ),
    (
        /// The `SHA256` Hash Function.
        Sha256, 32, ::sha2::Sha256, "SHA256"
    ),
    (
        /// The `SHA384` Hash Function.
        Sha384, 48, ::sha2::Sha384, "SHA384"
    ),
    (
        /// The `SHA512` Hash Function.
        Sha512, 64, ::sha2::Sha512, "SHA512"
    )
}
