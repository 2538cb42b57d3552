//! CMAC / OMAC1 (NIST SP 800-38B)
//!
//! Used by EAX, which runs three domain separated instances (`OMAC^t`). Works for both 8 and 16
//! byte block ciphers.

use zeroize::Zeroize;
use crate::buf::{Block, MAX_BLOCK_SIZE, xor_in_place};
use crate::cipher::Cipher;

#[inline]
fn dbl(block: &mut Block, bs: usize) {
    let rb: u8 = if bs == 16 { 0x87 } else { 0x1b };
    let carry = block[0] >> 7;

    for i in 0..bs - 1 {
        block[i] = (block[i] << 1) | (block[i + 1] >> 7);
    }

    block[bs - 1] = (block[bs - 1] << 1) ^ (rb & carry.wrapping_neg());
}

/// A streaming CMAC computation.
///
/// The most recent full block is held back until more data arrives, since the final block is
/// masked with a subkey before its encryption.
#[derive(Clone)]
pub struct Cmac {
    k1: Block,
    k2: Block,
    state: Block,
    buf: Block,
    pos: usize,
    bs: usize
}

opaque_dbg! { Cmac }

impl Cmac {
    /// Derives the two subkeys from `cipher`.
    pub fn new(cipher: &Cipher) -> Self {
        let bs = cipher.block_size();

        let mut k1 = [0u8; MAX_BLOCK_SIZE];
        cipher.encrypt_scratch(&mut k1);
        dbl(&mut k1, bs);

        let mut k2 = k1;
        dbl(&mut k2, bs);

        Self { k1, k2, state: [0u8; MAX_BLOCK_SIZE], buf: [0u8; MAX_BLOCK_SIZE], pos: 0, bs }
    }

    /// Creates the EAX `OMAC^t` instance, which has absorbed `[t]_n`.
    pub fn with_prefix(cipher: &Cipher, t: u8) -> Self {
        let mut mac = Self::new(cipher);
        let mut prefix = [0u8; MAX_BLOCK_SIZE];
        prefix[mac.bs - 1] = t;

        let bs = mac.bs;
        mac.update(cipher, &prefix[..bs]);
        mac
    }

    /// Absorbs `data`.
    pub fn update(&mut self, cipher: &Cipher, data: &[u8]) {
        let bs = self.bs;

        for byte in data {
            if self.pos == bs {
                xor_in_place(&mut self.state[..bs], &self.buf[..bs]);
                cipher.encrypt_scratch(&mut self.state);
                self.pos = 0;
            }

            self.buf[self.pos] = *byte;
            self.pos += 1;
        }
    }

    /// Completes the MAC, returning a block sized tag in the front of the block.
    pub fn finish(&mut self, cipher: &Cipher) -> Block {
        let bs = self.bs;

        if self.pos == bs {
            xor_in_place(&mut self.buf[..bs], &self.k1[..bs]);
        } else {
            self.buf[self.pos] = 0x80;
            self.buf[self.pos + 1..bs].fill(0);
            xor_in_place(&mut self.buf[..bs], &self.k2[..bs]);
        }

        xor_in_place(&mut self.state[..bs], &self.buf[..bs]);
        cipher.encrypt_scratch(&mut self.state);

        let out = self.state;
        self.buf.zeroize();
        self.pos = 0;
        out
    }
}

impl Zeroize for Cmac {
    #[inline]
    fn zeroize(&mut self) {
        self.k1.zeroize();
        self.k2.zeroize();
        self.state.zeroize();
        self.buf.zeroize();
        self.pos = 0;
    }
}

impl Drop for Cmac {
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

    fn mac(data: &[u8]) -> [u8; 16] {
        let cipher = Cipher::new(CipherKind::Aes128, &hex!("2b7e151628aed2a6abf7158809cf4f3c")).unwrap();
        let mut cmac = Cmac::new(&cipher);
        cmac.update(&cipher, data);
        cmac.finish(&cipher)
    }

    #[test]
    fn sp800_38b_aes128() {
        assert_eq!(mac(&[]), hex!("bb1d6929e95937287fa37d129b756746"));
        assert_eq!(
            mac(&hex!("6bc1bee22e409f96e93d7e117393172a")),
            hex!("070a16b46b4d4144f79bdd9dd04a287c")
        );
    }

    #[test]
    fn subkeys_sp800_38b() {
        let cipher = Cipher::new(CipherKind::Aes128, &hex!("2b7e151628aed2a6abf7158809cf4f3c")).unwrap();
        let cmac = Cmac::new(&cipher);
        assert_eq!(cmac.k1, hex!("fbeed618357133667c85e08f7236a8de"));
        assert_eq!(cmac.k2, hex!("f7ddac306ae266ccf90bc11ee46d513b"));
    }
}
