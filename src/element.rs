use core::fmt::Debug;
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::lanes::{Lanes, Scalar};
use crate::scratch::ScratchPair;

mod private {
    pub trait Sealed {}

    impl Sealed for i32 {}
    impl Sealed for u32 {}
    impl Sealed for f64 {}
}

/// Element types the engine can sort: `i32`, `u32` and `f64`.
///
/// Integers are sorted by their natural order. `f64` is sorted by the IEEE 754 total order, see
/// [`f64::total_cmp`], so every NaN finds a definite place and inputs containing NaN are still
/// sorted to an exact permutation.
///
/// This trait is sealed.
pub trait Element: Scalar + Debug + private::Sealed {
    #[doc(hidden)]
    type Lanes: Lanes<Elem = Self>;

    /// Padding value, the greatest value of the type under its sort order.
    const SENTINEL: Self;

    /// Elements per 256-bit register.
    const LANES: usize = <Self::Lanes as Lanes>::WIDTH;

    /// Elements per block, the unit every kernel and merge works on.
    const BLOCK: usize = 4 * Self::LANES;

    /// Process-wide scratch pair reused across calls, for types that keep one.
    #[doc(hidden)]
    fn scratch_cache() -> Option<&'static Mutex<ScratchPair<Self>>> {
        None
    }
}

/// Register type of `T`.
pub(crate) type Reg<T> = <T as Element>::Lanes;

#[cfg(all(target_arch = "x86_64", target_feature = "avx2", not(feature = "portable")))]
mod backend {
    pub type I32 = crate::lanes::I32x8;
    pub type U32 = crate::lanes::U32x8;
    pub type F64 = crate::lanes::F64x4;
}

#[cfg(not(all(target_arch = "x86_64", target_feature = "avx2", not(feature = "portable"))))]
mod backend {
    pub type I32 = crate::lanes::Portable<i32, 8>;
    pub type U32 = crate::lanes::Portable<u32, 8>;
    pub type F64 = crate::lanes::Portable<f64, 4>;
}

impl Element for i32 {
    type Lanes = backend::I32;

    const SENTINEL: Self = i32::MAX;
}

impl Element for u32 {
    type Lanes = backend::U32;

    const SENTINEL: Self = u32::MAX;
}

static F64_SCRATCH: Lazy<Mutex<ScratchPair<f64>>> = Lazy::new(|| Mutex::new(ScratchPair::new()));

impl Element for f64 {
    type Lanes = backend::F64;

    // Positive NaN with every payload bit set, above `+inf` in the total order.
    // SAFETY: every bit pattern is a valid `f64`.
    const SENTINEL: Self = unsafe { core::mem::transmute::<u64, f64>(0x7FFF_FFFF_FFFF_FFFF) };

    fn scratch_cache() -> Option<&'static Mutex<ScratchPair<Self>>> {
        Some(&F64_SCRATCH)
    }
}
