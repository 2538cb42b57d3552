//! Block Cipher Modes of Operation
//!
//! Every mode is driven by a borrowed [`Cipher`], the mode states only hold IVs, counters,
//! keystream, and MAC accumulators. All of them zero their state on drop.
//!
//! | Mode | Kind | Input |
//! |------|------|-------|
//! | [`ecb`] | block | multiple of the block size, [`ecb::steal`] for the tail |
//! | [`cbc`] | block | multiple of the block size, [`cbc::Cbc::steal`] for the tail |
//! | [`xts`] | block | multiple of 16, [`xts::Xts::steal`] for the tail |
//! | [`ctr`], [`cfb`], [`ofb`] | stream | any length |
//! | [`gcm`], [`ccm`], [`eax`] | AEAD | any length |

pub mod pkcs7;
pub mod ecb;
pub mod cbc;
pub mod xts;
pub mod ctr;
pub mod cfb;
pub mod ofb;
pub mod ghash;
pub mod gcm;
pub mod cmac;
pub mod ccm;
pub mod eax;

use crate::buf::Block;
use crate::cipher::Cipher;
use crate::error::Error;

/// Copies `input` to the front of `output`, returning the region to transform in place.
#[inline]
pub(crate) fn stage<'o>(input: &[u8], output: &'o mut [u8]) -> Result<&'o mut [u8], Error> {
    ensure!(
        output.len() >= input.len(),
        InvalidLength, input = input.len(), output = output.len(), "output too small"
    );

    let out = &mut output[..input.len()];
    out.copy_from_slice(input);
    Ok(out)
}

/// Checks that `len` is a whole number of `bs` sized blocks.
#[inline]
pub(crate) fn ensure_aligned(len: usize, bs: usize) -> Result<(), Error> {
    ensure!(len % bs == 0, InvalidLength, len, block_size = bs, "unaligned input");
    Ok(())
}

/// Copies a block sized IV into a scratch block.
#[inline]
pub(crate) fn load_iv(cipher: &Cipher, iv: &[u8]) -> Result<Block, Error> {
    let bs = cipher.block_size();
    ensure!(iv.len() == bs, InvalidContext, iv_len = iv.len(), block_size = bs, "iv rejected");

    let mut block = [0u8; crate::buf::MAX_BLOCK_SIZE];
    block[..bs].copy_from_slice(iv);
    Ok(block)
}

/// Increments the big-endian counter in `ctr`, wrapping.
#[inline]
pub(crate) fn increment_be(ctr: &mut [u8]) {
    let mut carry = 1u16;

    for b in ctr.iter_mut().rev() {
        let sum = u16::from(*b) + carry;
        *b = sum as u8;
        carry = sum >> 8;
    }
}
