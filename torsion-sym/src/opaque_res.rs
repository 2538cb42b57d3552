//! Convenient Error Handling and Accumulation
//!
//! This module provides a simple, opaque error type (`Res`) designed to prevent
//! side-channel attacks through timing or error messages. It allows for
//! accumulation of error states without revealing specific error details.
use crate::error::{Error, ErrorKind, Unspecified};

/// An opaque result type for error handling without exposing error details.
///
/// This type is designed to prevent side-channel attacks by not revealing
/// specific error information. It only indicates success or failure.
#[must_use = "You must handle the potential error"]
#[repr(transparent)]
pub struct Res(pub(crate) bool);

impl Default for Res {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Res {
    /// Represents a successful result.
    pub const OK: Self = Self(true);
    /// Represents an error result.
    pub const ERR: Self = Self(false);

    /// Creates a new `Res` instance initialized to `OK`.
    pub const fn new() -> Self {
        Self::OK
    }

    /// Checks if the result is OK (successful).
    #[inline]
    pub const fn is_ok(&self) -> bool {
        self.0
    }

    /// Checks if the result is an error.
    #[inline]
    pub const fn is_err(&self) -> bool {
        !self.0
    }

    /// Updates the result based on a boolean condition.
    ///
    /// If `res` is `false`, this method will set the `Res` to an error state.
    ///
    /// # Arguments
    ///
    /// * `res` - A boolean representing a condition to check.
    #[inline]
    pub fn check(&mut self, res: bool) {
        self.0 &= res;
    }

    /// Ensures that a constant-time mask is all ones (`0xFF`).
    ///
    /// Any other value puts the `Res` in the error state, without branching on the mask.
    #[inline]
    pub fn ensure_mask(&mut self, mask: u8) {
        self.0 &= (mask ^ 0xFF) == 0;
    }

    /// Combines this `Res` with another `Res`.
    ///
    /// The result will be OK only if both `Res` instances are OK.
    #[inline]
    pub fn ensure(&mut self, res: Self) {
        self.0 &= res.0;
    }

    /// Converts the `Res` into a `Result<OK, Unspecified>`.
    ///
    /// # Warning
    ///
    /// This method is not constant time and should be used carefully in
    /// security-sensitive contexts.
    #[allow(clippy::missing_errors_doc)]
    #[inline(always)]
    pub fn unit_err<OK>(self, ok: OK) -> Result<OK, Unspecified> {
        if self.is_ok() {
            Ok(ok)
        } else {
            Err(Unspecified)
        }
    }

    /// Converts the `Res` into a `Result<OK, Unspecified>`, with a closure for the OK case.
    ///
    /// The closure is only called if the `Res` is OK, use this when the creation of the `OK`
    /// value depends on the preceding checks having passed.
    #[inline(always)]
    #[allow(clippy::missing_errors_doc)]
    pub fn unit_err_with<F, OK>(self, ok: F) -> Result<OK, Unspecified>
        where F: FnOnce() -> OK
    {
        if self.is_ok() {
            Ok(ok())
        } else {
            Err(Unspecified)
        }
    }

    /// Converts the `Res` into a `Result<OK, Error>` using `kind` for the failure case.
    #[allow(clippy::missing_errors_doc)]
    #[inline]
    pub fn kind_err<OK>(self, ok: OK, kind: ErrorKind) -> Result<OK, Error> {
        if self.is_ok() {
            Ok(ok)
        } else {
            Err(Error::new(kind))
        }
    }

    /// Unwraps the `Res`, panicking if it's an error.
    ///
    /// # Panics
    ///
    /// Panics if the `Res` is an error.
    #[cfg(feature = "can-panic")]
    #[inline]
    #[track_caller]
    pub fn unwrap(self) {
        if self.is_err() {
            panic!("called `Res::unwrap()` on an error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates() {
        let mut res = Res::new();
        res.check(true);
        res.ensure_mask(0xFF);
        assert!(res.is_ok());

        res.ensure_mask(0xFE);
        assert!(res.is_err());

        res.check(true);
        assert!(res.is_err());
        assert_eq!(res.kind_err((), ErrorKind::PaddingError), Err(Error::new(ErrorKind::PaddingError)));
    }
}
