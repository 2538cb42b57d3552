use core::ops;
use core::fmt;
use proptest::arbitrary::{any, Arbitrary};
use proptest::array;
use proptest::collection::vec;
use proptest::num::u8::Any;
use proptest::sample::Index;
use proptest::strategy::{BoxedStrategy, Strategy};
use std::vec::Vec;
use crate::cipher::CipherKind;
use crate::stream::Mode;

/// A fixed capacity byte list with a random length, cheap to copy between the implementations
/// under comparison.
#[derive(Clone, Copy)]
pub struct BoundList<const C: usize> {
    inner: [u8; C],
    len: usize
}

impl<const C: usize> fmt::Debug for BoundList<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut dbg = f.debug_struct("BoundList");
        dbg.field("len", &self.len());

        if C <= 32 {
            dbg.field("inner", &self.as_slice());
        }

        dbg.finish()
    }
}

impl<const C: usize> BoundList<C> {
    pub const fn new_with_unchecked(inner: [u8; C], len: usize) -> Self {
        Self { inner, len }
    }

    #[inline]
    pub const fn new_zeroes_unchecked(len: usize) -> Self {
        Self::new_with_unchecked([0u8; C], len)
    }

    #[inline]
    pub const fn create_self(&self) -> Self {
        Self::new_zeroes_unchecked(self.len)
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[track_caller]
    #[inline]
    pub fn new_from_slice(slice: &[u8]) -> Self {
        assert!(slice.len() <= C, "Attempted to create `BoundList` from slice too large");
        let mut buf = [0u8; C];
        buf[..slice.len()].copy_from_slice(slice);

        Self::new_with_unchecked(buf, slice.len())
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.inner.as_slice()[..self.len()]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let len = self.len();
        &mut self.inner.as_mut_slice()[..len]
    }
}

impl<const C: usize> PartialEq for BoundList<C> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<const C: usize> ops::Deref for BoundList<C> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<const C: usize> ops::DerefMut for BoundList<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<const C: usize> Arbitrary for BoundList<C> {
    type Parameters = ();

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (0..=C, array::uniform::<Any, C>(any::<u8>()))
            .prop_map(|(len, buf)| {
                BoundList::new_with_unchecked(buf, len)
            })
            .boxed()
    }

    type Strategy = BoxedStrategy<Self>;
}

impl Arbitrary for CipherKind {
    type Parameters = ();

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (0u32..=CipherKind::MAX as u32)
            .prop_filter_map("cipher id in range", |id| CipherKind::try_from(id).ok())
            .boxed()
    }

    type Strategy = BoxedStrategy<Self>;
}

impl Arbitrary for Mode {
    type Parameters = ();

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (0u32..=Mode::MAX as u32)
            .prop_filter_map("mode id in range", |id| Mode::try_from(id).ok())
            .boxed()
    }

    type Strategy = BoxedStrategy<Self>;
}

/// A random key of the default length for `kind`.
pub fn key_for(kind: CipherKind) -> BoxedStrategy<(CipherKind, Vec<u8>)> {
    vec(any::<u8>(), kind.key_size())
        .prop_map(move |key| (kind, key))
        .boxed()
}

/// Random split points for feeding a buffer through an incremental API.
pub fn chunk_sizes() -> BoxedStrategy<Vec<usize>> {
    vec(1usize..=70, 1..16).boxed()
}

/// Splits `data` into consecutive chunks whose sizes cycle through `sizes`.
pub fn chunks<'a>(data: &'a [u8], sizes: &'a [usize]) -> impl Iterator<Item = &'a [u8]> + 'a {
    let mut rest = data;
    let mut idx = 0usize;

    core::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }

        let take = sizes[idx % sizes.len()].min(rest.len());
        idx += 1;

        let (head, tail) = rest.split_at(take);
        rest = tail;
        Some(head)
    })
}

/// A copy of `data` with a single bit flipped, `data` must not be empty.
pub fn flip_bit(data: &[u8], bit: Index) -> Vec<u8> {
    let bit = bit.index(data.len() * 8);
    let mut out = data.to_vec();
    out[bit / 8] ^= 1 << (bit % 8);
    out
}
