//! Register-level building blocks shared by every sorting network in the crate.
//!
//! A [`Lanes`] value is one 256-bit register worth of elements. The kernels and the merge
//! primitive are written once against this trait and instantiated per element type, either on
//! the AVX2 backend or on the portable array backend.

#[cfg_attr(
    all(target_arch = "x86_64", target_feature = "avx2", not(feature = "portable")),
    allow(dead_code)
)]
mod portable;

#[cfg(all(target_arch = "x86_64", target_feature = "avx2", not(feature = "portable")))]
mod avx2;

#[cfg(not(all(target_arch = "x86_64", target_feature = "avx2", not(feature = "portable"))))]
pub use portable::Portable;

#[cfg(all(target_arch = "x86_64", target_feature = "avx2", not(feature = "portable")))]
pub use avx2::{F64x4, I32x8, U32x8};

/// Scalar ordering used by every comparison in the engine.
///
/// Integers use their natural order, `f64` uses the IEEE 754 total order.
pub trait Scalar: Copy + Send + Sync + 'static {
    fn is_less(&self, other: &Self) -> bool;
}

impl Scalar for i32 {
    #[inline(always)]
    fn is_less(&self, other: &Self) -> bool {
        self < other
    }
}

impl Scalar for u32 {
    #[inline(always)]
    fn is_less(&self, other: &Self) -> bool {
        self < other
    }
}

impl Scalar for f64 {
    #[inline(always)]
    fn is_less(&self, other: &Self) -> bool {
        self.total_cmp(other).is_lt()
    }
}

/// One vector register holding `WIDTH` elements.
///
/// All operations are branch-free. Loads and stores require 32-byte alignment.
pub trait Lanes: Copy {
    type Elem: Scalar;

    const WIDTH: usize;

    fn splat(value: Self::Elem) -> Self;

    /// # Safety
    ///
    /// `ptr` must be 32-byte aligned and valid for reading `WIDTH` elements.
    unsafe fn load(ptr: *const Self::Elem) -> Self;

    /// # Safety
    ///
    /// `ptr` must be 32-byte aligned and valid for writing `WIDTH` elements.
    unsafe fn store(self, ptr: *mut Self::Elem);

    /// Reads `WIDTH` elements, `stride` elements apart, starting at `base`.
    ///
    /// # Safety
    ///
    /// Every `base + i * stride` for `i < WIDTH` must be valid for reads.
    unsafe fn gather(base: *const Self::Elem, stride: usize) -> Self;

    /// Lane-wise `if other < self { other } else { self }`.
    fn min(self, other: Self) -> Self;

    /// Lane-wise `if other < self { self } else { other }`.
    fn max(self, other: Self) -> Self;

    /// Compare-exchange between lane `j` and lane `j ^ stride`, the lower lane keeps the smaller
    /// element. `stride` must be a power of two below `WIDTH`.
    fn intra_compare(self, stride: usize) -> Self;

    /// Exchanges the upper half of `a` with the lower half of `b`.
    fn cross_half_swap(a: &mut Self, b: &mut Self);

    /// Interleaves `a` and `b` within each 128-bit half, `unpacklo`/`unpackhi` style.
    fn interleave(a: Self, b: Self) -> (Self, Self);

    fn reverse(self) -> Self;

    fn first(self) -> Self::Elem;

    fn last(self) -> Self::Elem;

    /// Lane-wise min/max swap, the comparator every network is built from.
    #[inline(always)]
    fn compare_exchange(lo: &mut Self, hi: &mut Self) {
        let min = lo.min(*hi);
        let max = lo.max(*hi);
        *lo = min;
        *hi = max;
    }

    /// Full interleave of `a` and `b`: `a0 b0 a1 b1 ...` across both outputs.
    #[inline(always)]
    fn zip(a: Self, b: Self) -> (Self, Self) {
        let (mut lo, mut hi) = Self::interleave(a, b);
        Self::cross_half_swap(&mut lo, &mut hi);
        (lo, hi)
    }
}

/// Compare-exchange of two registers of a lane set, by index.
#[inline(always)]
pub(crate) fn exchange_at<V: Lanes>(regs: &mut [V], lo: usize, hi: usize) {
    let (mut a, mut b) = (regs[lo], regs[hi]);
    V::compare_exchange(&mut a, &mut b);
    regs[lo] = a;
    regs[hi] = b;
}
