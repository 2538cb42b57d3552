//! `Read` / `Write` adapters binding a [`ChaCha20Poly1305`] context to an IO type.
//!
//! The phase is checked once when the adapter is created, so the adapters never fail on the
//! cryptographic side once bytes have moved through the wrapped IO.

use super::{ChaCha20Poly1305, Phase};
use crate::error::Error;

/// Absorbs everything moved through `IO` as additional authenticated data.
#[must_use]
pub struct Aad<'a, IO> {
    aead: &'a mut ChaCha20Poly1305,
    io: IO
}

impl<'a, IO> Aad<'a, IO> {
    /// Returns the wrapped IO, the context stays in the AAD phase.
    #[inline]
    pub fn finish(self) -> IO {
        self.io
    }

    #[inline]
    fn absorb(&mut self, data: &[u8]) -> Result<(), Error> {
        self.aead.aad(data)
    }
}

/// Encrypts or decrypts everything read through `IO` in place.
#[must_use]
pub struct Data<'a, IO> {
    aead: &'a mut ChaCha20Poly1305,
    io: IO
}

impl<'a, IO> Data<'a, IO> {
    /// Returns the wrapped IO.
    #[inline]
    pub fn finish(self) -> IO {
        self.io
    }

    #[inline]
    fn apply(&mut self, data: &mut [u8]) -> Result<(), Error> {
        match self.aead.phase {
            Phase::Encrypt => self.aead.encrypt_in_place(data),
            _ => self.aead.decrypt_in_place(data)
        }
    }
}

impl ChaCha20Poly1305 {
    /// Wrap `io` so that every byte written to or read from it is absorbed as AAD.
    ///
    /// # Errors
    ///
    /// `InvalidState` once any message bytes were processed or after finalization.
    ///
    /// # Example
    ///
    /// ```
    /// use torsion_sym::aead::ChaCha20Poly1305;
    #[cfg_attr(feature = "std", doc = "use std::io::Write;")]
    #[cfg_attr(all(feature = "embedded-io", not(feature = "std")), doc = "use embedded_io::Write;")]
    ///
    /// let mut ctx = ChaCha20Poly1305::new(&[7u8; 32], &[42u8; 12]).unwrap();
    /// let mut sink = [0u8; 16];
    ///
    #[cfg_attr(
        any(feature = "std", feature = "embedded-io"),
        doc = "let mut io = ctx.aad_io(sink.as_mut_slice()).unwrap();"
    )]
    #[cfg_attr(
        any(feature = "std", feature = "embedded-io"),
        doc = "io.write_all(b\"header\").unwrap();"
    )]
    #[cfg_attr(any(feature = "std", feature = "embedded-io"), doc = "let _ = io.finish();")]
    /// # let _ = &mut sink;
    ///
    /// let tag = ctx.finalize().unwrap();
    /// # let _ = tag;
    /// ```
    pub fn aad_io<IO>(&mut self, io: IO) -> Result<Aad<'_, IO>, Error> {
        ensure!(self.phase == Phase::Aad, InvalidState, phase = ?self.phase, "aad io out of order");
        Ok(Aad { aead: self, io })
    }

    /// Wrap `io` so that every byte read from it is encrypted in place.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the context is decrypting, authenticating or finalized.
    pub fn encrypt_io<IO>(&mut self, io: IO) -> Result<Data<'_, IO>, Error> {
        self.enter(Phase::Encrypt)?;
        Ok(Data { aead: self, io })
    }

    /// Wrap `io` so that every byte read from it is authenticated then decrypted in place.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the context is encrypting, authenticating or finalized.
    pub fn decrypt_io<IO>(&mut self, io: IO) -> Result<Data<'_, IO>, Error> {
        self.enter(Phase::Decrypt)?;
        Ok(Data { aead: self, io })
    }
}

std! {
    use std::io as std_io;

    impl<IO: std_io::Write> std_io::Write for Aad<'_, IO> {
        #[inline]
        fn write(&mut self, buf: &[u8]) -> std_io::Result<usize> {
            let amount = self.io.write(buf)?;
            self.absorb(&buf[..amount]).map_err(std_io::Error::other)?;
            Ok(amount)
        }

        #[inline]
        fn flush(&mut self) -> std_io::Result<()> {
            self.io.flush()
        }
    }

    impl<IO: std_io::Read> std_io::Read for Aad<'_, IO> {
        #[inline]
        fn read(&mut self, buf: &mut [u8]) -> std_io::Result<usize> {
            let read = self.io.read(buf)?;
            self.absorb(&buf[..read]).map_err(std_io::Error::other)?;
            Ok(read)
        }
    }

    impl<IO: std_io::Read> std_io::Read for Data<'_, IO> {
        #[inline]
        fn read(&mut self, buf: &mut [u8]) -> std_io::Result<usize> {
            let read = self.io.read(buf)?;
            self.apply(&mut buf[..read]).map_err(std_io::Error::other)?;
            Ok(read)
        }
    }
}

no_std_io! {
    use embedded_io::{self as eio, ErrorType};

    impl<IO> ErrorType for Aad<'_, IO> {
        type Error = Error;
    }

    impl<IO: eio::Write> eio::Write for Aad<'_, IO> {
        #[inline]
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            let amount = self.io.write(buf).map_err(|_| Error::new(crate::ErrorKind::InvalidState))?;
            self.absorb(&buf[..amount])?;
            Ok(amount)
        }

        #[inline]
        fn flush(&mut self) -> Result<(), Self::Error> {
            self.io.flush().map_err(|_| Error::new(crate::ErrorKind::InvalidState))
        }
    }

    impl<IO: eio::Read> eio::Read for Aad<'_, IO> {
        #[inline]
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let read = self.io.read(buf).map_err(|_| Error::new(crate::ErrorKind::InvalidState))?;
            self.absorb(&buf[..read])?;
            Ok(read)
        }
    }

    impl<IO> ErrorType for Data<'_, IO> {
        type Error = Error;
    }

    impl<IO: eio::Read> eio::Read for Data<'_, IO> {
        #[inline]
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let read = self.io.read(buf).map_err(|_| Error::new(crate::ErrorKind::InvalidState))?;
            self.apply(&mut buf[..read])?;
            Ok(read)
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    const KEY: [u8; 32] = [7u8; 32];
    const NONCE: [u8; 12] = [42u8; 12];

    #[test]
    fn io_matches_direct_calls() {
        let msg = b"the quick brown fox jumps over the lazy dog";

        let mut direct = ChaCha20Poly1305::new(&KEY, &NONCE).unwrap();
        direct.aad(b"header").unwrap();
        let mut expected = *msg;
        direct.encrypt_in_place(&mut expected).unwrap();
        let expected_tag = direct.finalize().unwrap();

        let mut ctx = ChaCha20Poly1305::new(&KEY, &NONCE).unwrap();
        let mut sink = std::vec::Vec::new();
        ctx.aad_io(&mut sink).unwrap().write_all(b"header").unwrap();
        assert_eq!(sink, b"header");

        let mut sealed = [0u8; 43];
        ctx.encrypt_io(msg.as_slice()).unwrap().read_exact(&mut sealed).unwrap();
        assert_eq!(sealed, expected);
        assert_eq!(ctx.finalize().unwrap(), expected_tag);

        let mut ctx = ChaCha20Poly1305::new(&KEY, &NONCE).unwrap();
        ctx.aad(b"header").unwrap();
        let mut opened = [0u8; 43];
        ctx.decrypt_io(sealed.as_slice()).unwrap().read_exact(&mut opened).unwrap();
        assert_eq!(&opened, msg);
        assert_eq!(ctx.finalize().unwrap(), expected_tag);
    }

    #[test]
    fn adapters_check_phase() {
        let mut ctx = ChaCha20Poly1305::new(&KEY, &NONCE).unwrap();
        ctx.encrypt_in_place(&mut [0u8; 4]).unwrap();

        assert!(ctx.aad_io(std::io::sink()).is_err());
        assert!(ctx.decrypt_io(std::io::empty()).is_err());
        assert!(ctx.encrypt_io(std::io::empty()).is_ok());
    }
}
