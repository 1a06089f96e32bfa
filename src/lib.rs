//! In-place ascending sort of `i32`, `u32` and `f64` slices built on vector sorting networks.
//!
//! The unit of work is a block of one register quad (32 elements of a 32-bit type, 16 doubles),
//! sorted and merged by fixed compare networks instead of element-by-element comparisons. Two
//! schedulers sit on top of the block kernels:
//!
//! * [`Strategy::Quick`] partitions whole blocks against a pivot with the block merge primitive
//!   and folds misaligned head and tail elements into the partition as it goes. This is the
//!   default.
//! * [`Strategy::Merge`] is a recursive merge sort over blocks with guaranteed *O*(*n* \* log(*n*))
//!   behavior. The quicksort also falls back to it for degenerate inputs.
//!
//! On `x86_64` builds with `avx2` enabled the networks run on AVX2 registers; everywhere else
//! the same networks run on a portable array backend. Enable the `portable` feature to force the
//! portable backend.
//!
//! ```ignore
//! let mut v = [5, 3, 3, 1, 9, 2, 8, 7, 6, 4];
//! simd_block_sort::sort(&mut v);
//! assert_eq!(v, [1, 2, 3, 3, 4, 5, 6, 7, 8, 9]);
//! ```

use core::fmt;
use core::str::FromStr;

mod dispatch;
mod element;
mod error;
mod kernel;
mod lanes;
mod merge;
mod mergesort;
mod pivot;
mod quicksort;
mod scratch;

pub use element::Element;
pub use error::SortError;

/// 32-byte aligned wrapper for stack buffers the kernels read and write directly.
#[derive(Clone, Copy)]
#[repr(C, align(32))]
pub(crate) struct Aligned<A>(pub(crate) A);

/// Scheduling strategy for inputs larger than four blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Block quicksort with fragment folding, falling back to [`Strategy::Merge`] on degenerate
    /// partitions.
    #[default]
    Quick,
    /// Block merge sort, *O*(*n* \* log(*n*)) for every input.
    Merge,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Quick => "quick",
            Strategy::Merge => "merge",
        })
    }
}

/// Error returned when parsing an unknown [`Strategy`] name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort strategy `{0}`, expected `quick` or `merge`")]
pub struct ParseStrategyError(String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" | "quicksort" => Ok(Strategy::Quick),
            "merge" | "mergesort" => Ok(Strategy::Merge),
            _ => Err(ParseStrategyError(s.to_owned())),
        }
    }
}

/// Sorts the slice in ascending order with the default strategy.
///
/// This sort is unstable (i.e., may reorder equal elements) and in-place. Inputs of more than
/// four blocks that are not block aligned, or that fall back to the merge sort, use a scratch
/// buffer.
///
/// # Panics
///
/// Panics if scratch memory cannot be allocated. Use [`try_sort`] to handle that case.
pub fn sort<T: Element>(v: &mut [T]) {
    sort_with(v, Strategy::default());
}

/// Sorts the slice in ascending order with the given strategy.
///
/// # Panics
///
/// Panics if scratch memory cannot be allocated. Use [`try_sort_with`] to handle that case.
pub fn sort_with<T: Element>(v: &mut [T], strategy: Strategy) {
    if let Err(err) = try_sort_with(v, strategy) {
        panic!("{strategy} sort of {} elements failed: {err}", v.len());
    }
}

/// Sorts the slice in ascending order with the default strategy.
///
/// On error the slice holds a permutation of its original elements.
pub fn try_sort<T: Element>(v: &mut [T]) -> Result<(), SortError> {
    try_sort_with(v, Strategy::default())
}

/// Sorts the slice in ascending order with the given strategy.
///
/// On error the slice holds a permutation of its original elements.
pub fn try_sort_with<T: Element>(v: &mut [T], strategy: Strategy) -> Result<(), SortError> {
    dispatch::sort_with(v, strategy)
}

/// Sorts `len` elements starting at `ptr` in ascending order.
///
/// The pointer only has to be aligned for `T`; coarser misalignment is handled by the engine.
/// A pointer that is not even aligned for `T` is rejected with [`SortError::Misaligned`] before
/// any memory is touched.
///
/// # Safety
///
/// Unless `len` is zero, `ptr` must be non-null and valid for reads and writes of `len`
/// consecutive elements, with no other live reference to that memory for the duration of the
/// call.
pub unsafe fn try_sort_raw<T: Element>(
    ptr: *mut T,
    len: usize,
    strategy: Strategy,
) -> Result<(), SortError> {
    let align = core::mem::align_of::<T>();
    if ptr as usize % align != 0 {
        return Err(SortError::Misaligned {
            addr: ptr as usize,
            align,
        });
    }
    if len == 0 {
        return Ok(());
    }

    // SAFETY: alignment was checked above, validity is the caller's obligation.
    let v = unsafe { core::slice::from_raw_parts_mut(ptr, len) };
    try_sort_with(v, strategy)
}
