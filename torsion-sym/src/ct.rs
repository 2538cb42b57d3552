//! Constant-Time Programming Utilities
//!
//! Helpers for comparing secret data and building masks without data-dependent branches. Used by
//! tag verification, PKCS#7 unpadding, and bcrypt record verification.

use crate::opaque_res::Res;

macro_rules! smear {
    ($b:ident) => {{
        $b |= $b >> 1;
        $b |= $b >> 2;
        $b |= $b >> 4;
        $b |= $b >> 8;
        $b |= $b >> 16;
    }};
}

/// Performs a constant-time greater-than comparison.
///
/// # Returns
///
/// Returns `1` if `left > right`, otherwise `0`.
pub const fn gt(left: u32, right: u32) -> u32 {
    let gtb = left & !right;
    let mut ltb = !left & right;

    smear!(ltb);

    let mut bit = gtb & !ltb;
    // smear the highest set bit
    smear!(bit);

    bit & 1
}

/// Expands a `0` / `1` bit into a `0x00` / `0xFF` byte mask.
#[inline(always)]
pub const fn bit_to_mask(bit: u32) -> u8 {
    (bit as u8).wrapping_neg()
}

#[inline(always)]
fn volatile(byte: u8) -> u8 {
    // Keeps the optimizer from turning the bit tricks below back into a compare + branch.
    unsafe { core::ptr::read_volatile(&byte) }
}

#[inline(always)]
fn eq_hsb(xor: u8) -> u8 {
    volatile(xor | volatile(xor.wrapping_neg())) >> 7
}

/// Returns `1` if `a == b`, otherwise `0`, without branching.
#[inline(always)]
pub fn byte_eq(a: u8, b: u8) -> u8 {
    eq_hsb(b ^ a) ^ volatile(1)
}

/// Returns `0xFF` if `a == b`, otherwise `0x00`, without branching.
#[inline(always)]
pub fn byte_eq_mask(a: u8, b: u8) -> u8 {
    byte_eq(a, b).wrapping_neg()
}

/// Selects `a` where `mask` is `0xFF` and `b` where it is `0x00`.
#[inline(always)]
pub const fn select(mask: u8, a: u8, b: u8) -> u8 {
    (a & mask) | (b & !mask)
}

/// Compare two slices in constant-time.
///
/// # Note
///
/// If the length of slice `a` and slice `b` are not equivalent, this will exit early. In short,
/// there is variable timing on length comparisons.
///
/// # Returns
///
/// * `0`: `a != b`
/// * `1`: `a == b`
#[must_use]
pub fn cmp_slice(a: &[u8], b: &[u8]) -> u8 {
    if a.len() != b.len() { return 0 }

    let mut res = volatile(1u8);

    for (l, r) in a.iter().zip(b.iter()) {
        res &= byte_eq(*l, *r);
    }

    res
}

/// Compare two slices in constant-time.
///
/// # Note
///
/// Lengths are public, differing lengths return early.
///
/// # Returns
///
/// `true` if `a == b`, `false` otherwise.
#[must_use]
pub fn ct_eq<A: AsRef<[u8]>, B: AsRef<[u8]>>(a: A, b: B) -> bool {
    cmp_slice(a.as_ref(), b.as_ref()) != 0
}

/// Compares two slices in constant-time, accumulating the outcome into a [`Res`].
#[inline]
pub fn ensure_eq(res: &mut Res, a: &[u8], b: &[u8]) {
    res.check(cmp_slice(a, b) == 1);
}
