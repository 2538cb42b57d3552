//! PKCS#7 Block Padding
//!
//! Unpadding inspects every byte of the block regardless of where the pad starts, the only
//! branch is on the final accept / reject.

use crate::ct;
use crate::error::Error;
use crate::opaque_res::Res;

/// Pads `block[pos..]` with `block.len() - pos` copies of that count.
///
/// `pos == block.len()` is not a valid partial position, a full block of padding is appended by
/// passing `pos == 0` on a fresh block.
#[inline]
pub fn pad(block: &mut [u8], pos: usize) {
    debug_assert!(pos < block.len() && block.len() <= 255);

    let fill = (block.len() - pos) as u8;
    for b in &mut block[pos..] {
        *b = fill;
    }
}

/// Returns the length of the message in the final padded `block`.
///
/// # Errors
///
/// `PaddingError` if the pad length is zero, exceeds the block, or any pad byte disagrees.
pub fn unpad(block: &[u8]) -> Result<usize, Error> {
    let bs = block.len();
    let Some(&last) = block.last() else {
        bail!(PaddingError, "empty block");
    };

    let mut res = Res::new();
    let n = u32::from(last);

    // 1 <= n <= bs
    res.ensure_mask(ct::bit_to_mask(ct::gt(n, 0)));
    res.ensure_mask(!ct::bit_to_mask(ct::gt(n, bs as u32)));

    for (i, b) in block.iter().enumerate() {
        // byte `i` lies in the pad iff bs - i <= n.
        let outside = ct::bit_to_mask(ct::gt((bs - i) as u32, n));
        res.ensure_mask(ct::byte_eq_mask(*b, last) | outside);
    }

    if res.is_ok() {
        Ok(bs - last as usize)
    } else {
        bail!(PaddingError, block_size = bs, "bad padding")
    }
}


#[cfg(all(test, not(miri)))]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(5000))]

        #[test]
        fn pad_then_unpad(data in any::<[u8; 16]>(), pos in 0usize..16, wide in any::<bool>()) {
            let bs = if wide { 16 } else { 8 };
            let pos = pos % bs;

            let mut block = data;
            pad(&mut block[..bs], pos);

            prop_assert_eq!(unpad(&block[..bs]).unwrap(), pos);
            prop_assert_eq!(&block[..pos], &data[..pos]);
        }

        #[test]
        fn unpad_agrees_with_naive(block in any::<[u8; 8]>()) {
            let n = block[7] as usize;
            let naive = (1..=8).contains(&n) && block[8 - n..].iter().all(|b| *b as usize == n);

            prop_assert_eq!(unpad(&block).is_ok(), naive);
        }
    }
}
