use core::fmt;

/// A generic error type representing an unspecified failure in cryptographic operations.
///
/// In cryptographic contexts, it is often necessary to hide the specific reason for
/// an operation's failure to prevent leaking sensitive information to potential attackers.
/// `Unspecified` serves this purpose by providing a simple, non-descriptive error type
/// that can be used in situations where the cause of the failure should not be exposed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Unspecified;

impl fmt::Display for Unspecified {
    /// Writes "Unspecified" to the formatter.
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Unspecified")
    }
}

std! { impl std::error::Error for Unspecified {} }

/// The category of an [`Error`].
///
/// None of the variants carry data, the kind alone never reveals secret material.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The key length is not accepted by the cipher or primitive.
    InvalidKeySize,
    /// The IV / nonce length, or the (cipher, mode) pairing, was rejected during setup.
    InvalidContext,
    /// The operation is not legal in the current state of the context.
    InvalidState,
    /// An input or output buffer has the wrong length for the operation.
    InvalidLength,
    /// The KDF parameters are out of range.
    InvalidParameters,
    /// PKCS#7 unpadding failed.
    PaddingError,
    /// The authentication tag did not match.
    TagMismatch,
    /// A serialized record (such as a bcrypt hash string) is malformed.
    InvalidEncoding,
}

impl ErrorKind {
    /// Returns a short, static description of the kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidKeySize => "invalid key size",
            Self::InvalidContext => "invalid context",
            Self::InvalidState => "invalid state",
            Self::InvalidLength => "invalid length",
            Self::InvalidParameters => "invalid parameters",
            Self::PaddingError => "padding error",
            Self::TagMismatch => "tag mismatch",
            Self::InvalidEncoding => "invalid encoding",
        }
    }
}

impl fmt::Display for ErrorKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error type for the fallible operations of this crate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Error {
    kind: ErrorKind
}

impl Error {
    /// Creates a new `Error` of the provided kind.
    #[inline]
    pub const fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    /// Returns the [`ErrorKind`] of this error.
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<Error> for Unspecified {
    #[inline]
    fn from(_value: Error) -> Self {
        Self
    }
}

impl PartialEq<ErrorKind> for Error {
    #[inline]
    fn eq(&self, other: &ErrorKind) -> bool {
        self.kind == *other
    }
}

impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

std! { impl std::error::Error for Error {} }

no_std_io! {
    impl embedded_io::Error for Error {
        fn kind(&self) -> embedded_io::ErrorKind {
            match self.kind {
                ErrorKind::InvalidLength => embedded_io::ErrorKind::InvalidInput,
                _ => embedded_io::ErrorKind::Other
            }
        }
    }
}

/// Erases the reason of a failure.
///
/// Useful at boundaries where an attacker could learn something from *why* an operation failed,
/// for example distinguishing a padding failure from a tag failure.
pub trait MakeOpaque<T> {
    /// Maps any error to [`Unspecified`].
    ///
    /// # Errors
    ///
    /// If `self` was an error.
    fn opaque(self) -> Result<T, Unspecified>;
}

impl<T, E> MakeOpaque<T> for Result<T, E> {
    #[inline]
    fn opaque(self) -> Result<T, Unspecified> {
        self.map_err(|_| Unspecified)
    }
}
