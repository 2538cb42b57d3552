//! Cipher Block Chaining
//!
//! `C_i = E(P_i ^ C_{i-1})`, `C_0 = IV`. [`Cbc::steal`] implements ciphertext stealing, the basis
//! of the CTS stream mode. The ordering is CS2: block-aligned input is plain CBC, otherwise the
//! full final block is emitted before the truncated penultimate one (as in CS3).

use zeroize::Zeroize;
use crate::buf::{Block, MAX_BLOCK_SIZE, xor_in_place};
use crate::cipher::Cipher;
use crate::error::Error;
use super::{ecb::check_steal, ensure_aligned, load_iv, stage};

/// CBC chaining state.
pub struct Cbc {
    prev: Block
}

opaque_dbg! { Cbc }

impl Cbc {
    /// Starts a chain from `iv`.
    ///
    /// # Errors
    ///
    /// `InvalidContext` if `iv` is not one block of `cipher`.
    pub fn new(cipher: &Cipher, iv: &[u8]) -> Result<Self, Error> {
        Ok(Self { prev: load_iv(cipher, iv)? })
    }

    /// Encrypts whole blocks in place.
    ///
    /// # Errors
    ///
    /// If `data` is not a multiple of the block size.
    pub fn encrypt_in_place(&mut self, cipher: &Cipher, data: &mut [u8]) -> Result<(), Error> {
        let bs = cipher.block_size();
        ensure_aligned(data.len(), bs)?;

        for block in data.chunks_exact_mut(bs) {
            xor_in_place(block, &self.prev[..bs]);
            cipher.encrypt_unchecked(block);
            self.prev[..bs].copy_from_slice(block);
        }

        Ok(())
    }

    /// Decrypts whole blocks in place.
    ///
    /// # Errors
    ///
    /// If `data` is not a multiple of the block size.
    pub fn decrypt_in_place(&mut self, cipher: &Cipher, data: &mut [u8]) -> Result<(), Error> {
        let bs = cipher.block_size();
        ensure_aligned(data.len(), bs)?;

        let mut next = [0u8; MAX_BLOCK_SIZE];

        for block in data.chunks_exact_mut(bs) {
            next[..bs].copy_from_slice(block);
            cipher.decrypt_unchecked(block);
            xor_in_place(block, &self.prev[..bs]);
            self.prev[..bs].copy_from_slice(&next[..bs]);
        }

        next.zeroize();
        Ok(())
    }

    /// Encrypts `input` into the front of `output`.
    ///
    /// # Errors
    ///
    /// If `input` is unaligned or `output` is shorter than `input`.
    pub fn encrypt(&mut self, cipher: &Cipher, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
        ensure_aligned(input.len(), cipher.block_size())?;
        self.encrypt_in_place(cipher, stage(input, output)?)
    }

    /// Decrypts `input` into the front of `output`.
    ///
    /// # Errors
    ///
    /// If `input` is unaligned or `output` is shorter than `input`.
    pub fn decrypt(&mut self, cipher: &Cipher, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
        ensure_aligned(input.len(), cipher.block_size())?;
        self.decrypt_in_place(cipher, stage(input, output)?)
    }

    /// Ciphertext stealing for the final partial block.
    ///
    /// `last` is the most recent ciphertext block (already chained into this state) and
    /// `partial` the final plaintext bytes. On return `last` holds the full output block and
    /// `partial` the truncated previous block, output in that order.
    ///
    /// # Errors
    ///
    /// If `last` is not one block, or `partial` is not shorter than one block.
    pub fn steal(&mut self, cipher: &Cipher, last: &mut [u8], partial: &mut [u8]) -> Result<(), Error> {
        check_steal(cipher, last, partial)?;

        let bs = cipher.block_size();
        let d = partial.len();

        let mut x = [0u8; MAX_BLOCK_SIZE];
        x[..d].copy_from_slice(partial);
        xor_in_place(&mut x[..bs], last);
        cipher.encrypt_unchecked(&mut x[..bs]);

        partial.copy_from_slice(&last[..d]);
        last.copy_from_slice(&x[..bs]);
        self.prev[..bs].copy_from_slice(&x[..bs]);

        x.zeroize();
        Ok(())
    }

    /// Reverses [`steal`](Self::steal).
    ///
    /// `last` is the full ciphertext block, `partial` the truncated one, and this state is
    /// chained up to the block before them. On return they hold the penultimate plaintext block
    /// and the final partial plaintext.
    ///
    /// # Errors
    ///
    /// If `last` is not one block, or `partial` is not shorter than one block.
    pub fn unsteal(&mut self, cipher: &Cipher, last: &mut [u8], partial: &mut [u8]) -> Result<(), Error> {
        check_steal(cipher, last, partial)?;

        let bs = cipher.block_size();
        let d = partial.len();

        // Z = (P_n || 0) ^ C_{n-1}
        let mut z = [0u8; MAX_BLOCK_SIZE];
        z[..bs].copy_from_slice(last);
        cipher.decrypt_unchecked(&mut z[..bs]);

        // C_{n-1} = C_n' || Z[d..]
        let mut prev_ct = z;
        prev_ct[..d].copy_from_slice(partial);

        // P_n = Z[..d] ^ C_{n-1}[..d]
        xor_in_place(partial, &z[..d]);

        last.copy_from_slice(&prev_ct[..bs]);
        cipher.decrypt_unchecked(last);
        xor_in_place(last, &self.prev[..bs]);
        self.prev[..bs].copy_from_slice(&prev_ct[..bs]);

        z.zeroize();
        prev_ct.zeroize();
        Ok(())
    }
}

impl Zeroize for Cbc {
    #[inline]
    fn zeroize(&mut self) {
        self.prev.zeroize();
    }
}

impl Drop for Cbc {
    #[inline]
    fn drop(&mut self) {
        self.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::CipherKind;
    use hex_literal::hex;

    const KEY: [u8; 16] = hex!("2b7e151628aed2a6abf7158809cf4f3c");
    const IV: [u8; 16] = hex!("000102030405060708090a0b0c0d0e0f");

    #[test]
    fn sp800_38a_cbc_aes128() {
        let cipher = Cipher::new(CipherKind::Aes128, &KEY).unwrap();
        let plain = hex!("6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51");

        let mut data = plain;
        Cbc::new(&cipher, &IV).unwrap().encrypt_in_place(&cipher, &mut data).unwrap();
        assert_eq!(data, hex!("7649abac8119b246cee98e9b12e9197d5086cb9b507219ee95db113a917678b2"));

        Cbc::new(&cipher, &IV).unwrap().decrypt_in_place(&cipher, &mut data).unwrap();
        assert_eq!(data, plain);
    }

    #[test]
    fn iv_must_be_one_block() {
        let cipher = Cipher::new(CipherKind::Aes128, &KEY).unwrap();
        assert_eq!(Cbc::new(&cipher, &[0; 8]).unwrap_err().kind(), crate::ErrorKind::InvalidContext);
    }

    #[test]
    fn chained_calls_match_one_call() {
        let cipher = Cipher::new(CipherKind::Aes128, &KEY).unwrap();
        let plain = [0x3Cu8; 64];

        let mut whole = plain;
        Cbc::new(&cipher, &IV).unwrap().encrypt_in_place(&cipher, &mut whole).unwrap();

        let mut split = plain;
        let mut cbc = Cbc::new(&cipher, &IV).unwrap();
        let (a, b) = split.split_at_mut(32);
        cbc.encrypt_in_place(&cipher, a).unwrap();
        cbc.encrypt_in_place(&cipher, b).unwrap();

        assert_eq!(whole, split);
    }

    #[test]
    fn steal_round_trip() {
        let cipher = Cipher::new(CipherKind::Aes128, &KEY).unwrap();
        let plain = *b"sixteen byte blk+tail";

        let mut enc = Cbc::new(&cipher, &IV).unwrap();
        let mut last = [0u8; 16];
        enc.encrypt(&cipher, &plain[..16], &mut last).unwrap();

        let mut partial = [0u8; 5];
        partial.copy_from_slice(&plain[16..]);
        enc.steal(&cipher, &mut last, &mut partial).unwrap();

        let mut dec = Cbc::new(&cipher, &IV).unwrap();
        dec.unsteal(&cipher, &mut last, &mut partial).unwrap();

        assert_eq!(&last, &plain[..16]);
        assert_eq!(&partial, &plain[16..]);
    }
}

#[cfg(all(test, not(miri)))]
mod property_tests {
    use super::*;
    use crate::cipher::CipherKind;
    use crate::test_utils::BoundList;
    use ::aes::Aes128;
    use ::cbc::cipher::{BlockEncryptMut, BlockDecryptMut, KeyIvInit, block_padding::NoPadding};
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn matches_rust_crypto_cbc(
            key in any::<[u8; 16]>(),
            iv in any::<[u8; 16]>(),
            input in any::<BoundList<256>>()
        ) {
            let len = input.len() - input.len() % 16;
            let input = &input[..len];

            let cipher = Cipher::new(CipherKind::Aes128, &key).unwrap();
            let mut ours = input.to_vec();
            Cbc::new(&cipher, &iv).unwrap().encrypt_in_place(&cipher, &mut ours).unwrap();

            let mut theirs = input.to_vec();
            ::cbc::Encryptor::<Aes128>::new(&key.into(), &iv.into())
                .encrypt_padded_mut::<NoPadding>(&mut theirs, len)
                .unwrap();

            prop_assert_eq!(&ours, &theirs);

            ::cbc::Decryptor::<Aes128>::new(&key.into(), &iv.into())
                .decrypt_padded_mut::<NoPadding>(&mut theirs)
                .unwrap();
            prop_assert_eq!(theirs.as_slice(), input);
        }
    }
}
