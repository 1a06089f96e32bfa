use core::array;

use super::{Lanes, Scalar};

/// Array-backed register, used when AVX2 is not enabled at compile time.
///
/// The lane semantics mirror the AVX2 backend exactly, including the per-128-bit-half behavior
/// of [`Lanes::interleave`], so both backends run the very same networks.
#[derive(Clone, Copy, Debug)]
#[repr(C, align(32))]
pub struct Portable<T, const W: usize>(pub [T; W]);

impl<T: Scalar, const W: usize> Lanes for Portable<T, W> {
    type Elem = T;

    const WIDTH: usize = W;

    #[inline(always)]
    fn splat(value: T) -> Self {
        Self([value; W])
    }

    #[inline(always)]
    unsafe fn load(ptr: *const T) -> Self {
        debug_assert_eq!(ptr as usize % 32, 0);
        Self(ptr.cast::<[T; W]>().read())
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut T) {
        debug_assert_eq!(ptr as usize % 32, 0);
        ptr.cast::<[T; W]>().write(self.0);
    }

    #[inline(always)]
    unsafe fn gather(base: *const T, stride: usize) -> Self {
        // SAFETY: the caller guarantees every strided position is readable.
        Self(array::from_fn(|i| unsafe { base.add(i * stride).read() }))
    }

    #[inline(always)]
    fn min(self, other: Self) -> Self {
        Self(array::from_fn(|i| {
            if other.0[i].is_less(&self.0[i]) {
                other.0[i]
            } else {
                self.0[i]
            }
        }))
    }

    #[inline(always)]
    fn max(self, other: Self) -> Self {
        Self(array::from_fn(|i| {
            if other.0[i].is_less(&self.0[i]) {
                self.0[i]
            } else {
                other.0[i]
            }
        }))
    }

    #[inline(always)]
    fn intra_compare(self, stride: usize) -> Self {
        debug_assert!(stride.is_power_of_two() && stride < W);
        let partner = Self(array::from_fn(|i| self.0[i ^ stride]));
        let min = self.min(partner);
        let max = partner.max(self);
        Self(array::from_fn(|i| if i & stride == 0 { min.0[i] } else { max.0[i] }))
    }

    #[inline(always)]
    fn cross_half_swap(a: &mut Self, b: &mut Self) {
        let half = W / 2;
        for i in 0..half {
            core::mem::swap(&mut a.0[half + i], &mut b.0[i]);
        }
    }

    #[inline(always)]
    fn interleave(a: Self, b: Self) -> (Self, Self) {
        let half = W / 2;
        let quarter = W / 4;
        let pick = |i: usize, upper: usize| {
            let base = (i / half) * half + upper * quarter + (i % half) / 2;
            if i % 2 == 0 {
                a.0[base]
            } else {
                b.0[base]
            }
        };
        (
            Self(array::from_fn(|i| pick(i, 0))),
            Self(array::from_fn(|i| pick(i, 1))),
        )
    }

    #[inline(always)]
    fn reverse(self) -> Self {
        Self(array::from_fn(|i| self.0[W - 1 - i]))
    }

    #[inline(always)]
    fn first(self) -> T {
        self.0[0]
    }

    #[inline(always)]
    fn last(self) -> T {
        self.0[W - 1]
    }
}
