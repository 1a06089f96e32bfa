use core::array;

use log::trace;

use crate::element::{Element, Reg};
use crate::error::Result;
use crate::kernel::{sort_1u, sort_regs};
use crate::lanes::{Lanes, Scalar};
use crate::quicksort::quick_sort;
use crate::Aligned;

// Below this many blocks the pivot is a median of three.
const MEDIAN3_MAX_BLOCKS: usize = 8;

// With at least this many full sample windows the pivot comes from a sorted prefix of window
// medians.
const MIN_WINDOWS: usize = 3;

/// Selects a pivot value for the block range `v`, a whole number of aligned, individually
/// sorted blocks.
///
/// Every sample is the middle element of a block. Returns `None` if no sample could be taken.
/// Afterwards `v` is a permutation of its input in which every block is still sorted.
pub(crate) fn choose<T: Element>(v: &mut [T]) -> Result<Option<T>> {
    let u = T::BLOCK;
    let blocks = v.len() / u;
    debug_assert!(v.len() % u == 0);

    if blocks == 0 {
        return Ok(None);
    }

    let pivot = if blocks < MEDIAN3_MAX_BLOCKS {
        Some(median3_of_blocks(v, blocks))
    } else if blocks < MIN_WINDOWS * window_blocks::<T>() {
        Some(sampled_median(v, blocks))
    } else {
        windowed_median(v, blocks)?
    };

    trace!("pivot {pivot:?} of {blocks} blocks");
    Ok(pivot)
}

/// Blocks covered by one sample window, one sample per block.
#[inline]
fn window_blocks<T: Element>() -> usize {
    2 * T::BLOCK
}

/// Index of the sampled element within a block.
#[inline]
fn mid<T: Element>() -> usize {
    T::BLOCK / 2 - 1
}

fn median3_of_blocks<T: Element>(v: &[T], blocks: usize) -> T {
    let u = T::BLOCK;
    let a = &v[mid::<T>()];
    let b = &v[(blocks / 2) * u + mid::<T>()];
    let c = &v[(blocks - 1) * u + mid::<T>()];
    *median3(a, b, c)
}

/// Calculates the median of 3 elements.
#[inline(always)]
fn median3<'a, T: Scalar>(a: &'a T, b: &'a T, c: &'a T) -> &'a T {
    let x = a.is_less(b);
    let y = a.is_less(c);
    if x == y {
        // If x=y=0 then b, c <= a. In this case we want to return max(b, c).
        // If x=y=1 then a < b, c. In this case we want to return min(b, c).
        // By toggling the outcome of b < c using XOR x we get this behavior.
        let z = b.is_less(c);
        if z ^ x {
            c
        } else {
            b
        }
    } else {
        // Either c <= a < b or b <= a < c, thus a is our median.
        a
    }
}

/// Gathers the middle elements of `groups` groups of `WIDTH` consecutive blocks starting at
/// `base`, and sorts them in registers. Unpopulated groups hold the sentinel.
///
/// # Safety
///
/// `base` must be valid for reads of `groups * WIDTH` blocks, `groups <= 8`.
unsafe fn gather_sorted<T: Element>(base: *const T, groups: usize) -> Aligned<[T; 64]> {
    let u = T::BLOCK;
    let stride = T::LANES * u;
    debug_assert!(groups <= 8);

    let mut regs: [Reg<T>; 8] = array::from_fn(|g| {
        if g < groups {
            // SAFETY: group `g` lies within the first `groups * WIDTH` blocks.
            unsafe { Reg::<T>::gather(base.add(g * stride + mid::<T>()), u) }
        } else {
            Reg::<T>::splat(T::SENTINEL)
        }
    });
    sort_regs(&mut regs);

    let mut out = Aligned([T::SENTINEL; 64]);
    for (i, reg) in regs.iter().enumerate() {
        // SAFETY: the eight registers hold `8 * WIDTH <= 64` elements.
        unsafe { reg.store(out.0.as_mut_ptr().add(i * T::LANES)) };
    }
    out
}

/// Median of the middle elements of up to one window of blocks at the front of `v`.
fn sampled_median<T: Element>(v: &[T], blocks: usize) -> T {
    let groups = (blocks / T::LANES).min(8);
    debug_assert!(groups > 0);

    // SAFETY: `groups * WIDTH <= blocks` blocks are read.
    let sorted = unsafe { gather_sorted(v.as_ptr(), groups) };
    sorted.0[groups * T::LANES / 2]
}

/// Collects the median of every full window at the front of `v`, sorts that prefix and returns
/// its middle.
fn windowed_median<T: Element>(v: &mut [T], blocks: usize) -> Result<Option<T>> {
    let u = T::BLOCK;
    let per_window = window_blocks::<T>();
    let windows = blocks / per_window;

    let mut idx = 0;
    for w in 0..windows {
        let first = w * per_window;
        // SAFETY: window `w` holds `per_window = 8 * WIDTH` blocks inside `v`.
        let sorted = unsafe { gather_sorted(v[first * u..].as_ptr(), 8) };
        let center = sorted.0[u];

        let found = (first..first + per_window).find(|&j| {
            let x = &v[j * u + mid::<T>()];
            !x.is_less(&center) && !center.is_less(x)
        });
        // The center was gathered from this window, so the search cannot miss.
        let Some(j) = found else { continue };

        v.swap(idx, j * u + mid::<T>());
        if j != 0 {
            let block = v[j * u..].as_mut_ptr();
            // SAFETY: block `j` is aligned and lies inside `v`.
            unsafe { sort_1u(block, block) };
        }
        idx += 1;
    }

    if idx == 0 {
        return Ok(None);
    }

    quick_sort(&mut v[..idx])?;
    let pivot = v[idx / 2];

    if idx % u != 0 {
        let block = v[(idx / u) * u..].as_mut_ptr();
        // SAFETY: the block containing `idx` is aligned and lies inside `v`.
        unsafe { sort_1u(block, block) };
    }

    Ok(Some(pivot))
}
