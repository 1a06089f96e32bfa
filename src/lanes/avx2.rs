#![allow(unused_unsafe)]

//! AVX2 registers. Only compiled when `avx2` is enabled for the whole build, so the intrinsics
//! below never run on a CPU without it.

use core::arch::x86_64::*;

use super::Lanes;

macro_rules! impl_epi32_lanes {
    ($name:ident, $elem:ty, $min:ident, $max:ident) => {
        #[derive(Clone, Copy, Debug)]
        #[repr(transparent)]
        pub struct $name(__m256i);

        impl Lanes for $name {
            type Elem = $elem;

            const WIDTH: usize = 8;

            #[inline(always)]
            fn splat(value: $elem) -> Self {
                // SAFETY: avx2 is enabled at compile time.
                Self(unsafe { _mm256_set1_epi32(value as i32) })
            }

            #[inline(always)]
            unsafe fn load(ptr: *const $elem) -> Self {
                Self(_mm256_load_si256(ptr.cast::<__m256i>()))
            }

            #[inline(always)]
            unsafe fn store(self, ptr: *mut $elem) {
                _mm256_store_si256(ptr.cast::<__m256i>(), self.0);
            }

            #[inline(always)]
            unsafe fn gather(base: *const $elem, stride: usize) -> Self {
                let s = stride as i32;
                let index = _mm256_setr_epi32(0, s, 2 * s, 3 * s, 4 * s, 5 * s, 6 * s, 7 * s);
                Self(_mm256_i32gather_epi32::<4>(base.cast::<i32>(), index))
            }

            #[inline(always)]
            fn min(self, other: Self) -> Self {
                // SAFETY: avx2 is enabled at compile time.
                Self(unsafe { $min(self.0, other.0) })
            }

            #[inline(always)]
            fn max(self, other: Self) -> Self {
                // SAFETY: avx2 is enabled at compile time.
                Self(unsafe { $max(self.0, other.0) })
            }

            #[inline(always)]
            fn intra_compare(self, stride: usize) -> Self {
                // SAFETY: avx2 is enabled at compile time.
                unsafe {
                    let v = self.0;
                    match stride {
                        1 => {
                            let p = _mm256_shuffle_epi32::<0xB1>(v);
                            Self(_mm256_blend_epi32::<0xAA>($min(v, p), $max(v, p)))
                        }
                        2 => {
                            let p = _mm256_shuffle_epi32::<0x4E>(v);
                            Self(_mm256_blend_epi32::<0xCC>($min(v, p), $max(v, p)))
                        }
                        4 => {
                            let p = _mm256_permute2x128_si256::<0x01>(v, v);
                            Self(_mm256_blend_epi32::<0xF0>($min(v, p), $max(v, p)))
                        }
                        _ => unreachable!("no lane stride {stride} in a register of 8"),
                    }
                }
            }

            #[inline(always)]
            fn cross_half_swap(a: &mut Self, b: &mut Self) {
                // SAFETY: avx2 is enabled at compile time.
                unsafe {
                    let lo = _mm256_permute2x128_si256::<0x20>(a.0, b.0);
                    let hi = _mm256_permute2x128_si256::<0x31>(a.0, b.0);
                    a.0 = lo;
                    b.0 = hi;
                }
            }

            #[inline(always)]
            fn interleave(a: Self, b: Self) -> (Self, Self) {
                // SAFETY: avx2 is enabled at compile time.
                unsafe {
                    (
                        Self(_mm256_unpacklo_epi32(a.0, b.0)),
                        Self(_mm256_unpackhi_epi32(a.0, b.0)),
                    )
                }
            }

            #[inline(always)]
            fn reverse(self) -> Self {
                // SAFETY: avx2 is enabled at compile time.
                unsafe {
                    let flip = _mm256_setr_epi32(7, 6, 5, 4, 3, 2, 1, 0);
                    Self(_mm256_permutevar8x32_epi32(self.0, flip))
                }
            }

            #[inline(always)]
            fn first(self) -> $elem {
                // SAFETY: avx2 is enabled at compile time.
                unsafe { _mm256_cvtsi256_si32(self.0) as $elem }
            }

            #[inline(always)]
            fn last(self) -> $elem {
                // SAFETY: avx2 is enabled at compile time.
                unsafe { _mm256_extract_epi32::<7>(self.0) as $elem }
            }
        }
    };
}

impl_epi32_lanes!(I32x8, i32, _mm256_min_epi32, _mm256_max_epi32);
impl_epi32_lanes!(U32x8, u32, _mm256_min_epu32, _mm256_max_epu32);

/// Four `f64` lanes ordered by the IEEE 754 total order.
#[derive(Clone, Copy, Debug)]
#[repr(transparent)]
pub struct F64x4(__m256d);

/// Maps every double to an `i64` whose signed order is the total order of the doubles, the same
/// bit trick `f64::total_cmp` uses.
#[inline(always)]
unsafe fn total_key(v: __m256d) -> __m256i {
    let bits = _mm256_castpd_si256(v);
    let negative = _mm256_cmpgt_epi64(_mm256_setzero_si256(), bits);
    _mm256_xor_si256(bits, _mm256_srli_epi64::<1>(negative))
}

/// All-ones lanes where `a < b`.
#[inline(always)]
unsafe fn less_mask(a: __m256d, b: __m256d) -> __m256d {
    _mm256_castsi256_pd(_mm256_cmpgt_epi64(total_key(b), total_key(a)))
}

#[inline(always)]
unsafe fn min_pd(a: __m256d, b: __m256d) -> __m256d {
    _mm256_blendv_pd(a, b, less_mask(b, a))
}

#[inline(always)]
unsafe fn max_pd(a: __m256d, b: __m256d) -> __m256d {
    _mm256_blendv_pd(b, a, less_mask(b, a))
}

impl Lanes for F64x4 {
    type Elem = f64;

    const WIDTH: usize = 4;

    #[inline(always)]
    fn splat(value: f64) -> Self {
        // SAFETY: avx2 is enabled at compile time.
        Self(unsafe { _mm256_set1_pd(value) })
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f64) -> Self {
        Self(_mm256_load_pd(ptr))
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f64) {
        _mm256_store_pd(ptr, self.0);
    }

    #[inline(always)]
    unsafe fn gather(base: *const f64, stride: usize) -> Self {
        let s = stride as i32;
        let index = _mm_setr_epi32(0, s, 2 * s, 3 * s);
        Self(_mm256_i32gather_pd::<8>(base, index))
    }

    #[inline(always)]
    fn min(self, other: Self) -> Self {
        // SAFETY: avx2 is enabled at compile time.
        Self(unsafe { min_pd(self.0, other.0) })
    }

    #[inline(always)]
    fn max(self, other: Self) -> Self {
        // SAFETY: avx2 is enabled at compile time.
        Self(unsafe { max_pd(self.0, other.0) })
    }

    #[inline(always)]
    fn intra_compare(self, stride: usize) -> Self {
        // SAFETY: avx2 is enabled at compile time.
        unsafe {
            let v = self.0;
            match stride {
                1 => {
                    let p = _mm256_permute_pd::<0b0101>(v);
                    Self(_mm256_blend_pd::<0b1010>(min_pd(v, p), max_pd(p, v)))
                }
                2 => {
                    let p = _mm256_permute2f128_pd::<0x01>(v, v);
                    Self(_mm256_blend_pd::<0b1100>(min_pd(v, p), max_pd(p, v)))
                }
                _ => unreachable!("no lane stride {stride} in a register of 4"),
            }
        }
    }

    #[inline(always)]
    fn cross_half_swap(a: &mut Self, b: &mut Self) {
        // SAFETY: avx2 is enabled at compile time.
        unsafe {
            let lo = _mm256_permute2f128_pd::<0x20>(a.0, b.0);
            let hi = _mm256_permute2f128_pd::<0x31>(a.0, b.0);
            a.0 = lo;
            b.0 = hi;
        }
    }

    #[inline(always)]
    fn interleave(a: Self, b: Self) -> (Self, Self) {
        // SAFETY: avx2 is enabled at compile time.
        unsafe {
            (
                Self(_mm256_unpacklo_pd(a.0, b.0)),
                Self(_mm256_unpackhi_pd(a.0, b.0)),
            )
        }
    }

    #[inline(always)]
    fn reverse(self) -> Self {
        // SAFETY: avx2 is enabled at compile time.
        Self(unsafe { _mm256_permute4x64_pd::<0x1B>(self.0) })
    }

    #[inline(always)]
    fn first(self) -> f64 {
        // SAFETY: avx2 is enabled at compile time.
        unsafe { _mm256_cvtsd_f64(self.0) }
    }

    #[inline(always)]
    fn last(self) -> f64 {
        // SAFETY: avx2 is enabled at compile time.
        unsafe { _mm256_cvtsd_f64(_mm256_permute4x64_pd::<0xFF>(self.0)) }
    }
}
