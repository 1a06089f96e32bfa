//! Entry dispatch: size classes, alignment, padding and strategy selection.

use log::debug;

use crate::element::Element;
use crate::error::Result;
use crate::mergesort::merge_sort_blocks;
use crate::quicksort::quick_sort;
use crate::scratch::{with_scratch, BLOCK_ALIGN};
use crate::{Aligned, Strategy};

/// Largest input, in elements, handled on the stack. Four blocks of a 32-bit type.
pub(crate) const SMALL_SORT_CAP: usize = 128;

#[inline]
pub(crate) fn round_up_to_block<T: Element>(len: usize) -> usize {
    len.div_ceil(T::BLOCK) * T::BLOCK
}

#[inline]
pub(crate) fn is_block_aligned<T>(ptr: *const T) -> bool {
    ptr as usize % BLOCK_ALIGN == 0
}

pub(crate) fn sort_with<T: Element>(v: &mut [T], strategy: Strategy) -> Result<()> {
    let len = v.len();
    if len < 2 {
        return Ok(());
    }

    if len <= 4 * T::BLOCK {
        small_sort(v);
        return Ok(());
    }

    match strategy {
        Strategy::Merge => merge_sort(v),
        Strategy::Quick => quick_sort(v),
    }
}

/// Sorts at most four blocks through a padded stack buffer, without touching the heap.
pub(crate) fn small_sort<T: Element>(v: &mut [T]) {
    let len = v.len();
    assert!(len <= 4 * T::BLOCK && len <= SMALL_SORT_CAP);
    if len < 2 {
        return;
    }

    let padded = round_up_to_block::<T>(len);
    let mut buf = Aligned([T::SENTINEL; SMALL_SORT_CAP]);
    let mut scratch = Aligned([T::SENTINEL; SMALL_SORT_CAP]);

    buf.0[..len].copy_from_slice(v);
    merge_sort_blocks(&mut buf.0[..padded], &mut scratch.0[..padded]);
    v.copy_from_slice(&buf.0[..len]);
}

/// Sorts `v` with the merge-sort scheduler.
///
/// Block aligned inputs of whole blocks are sorted in place; anything else is copied into a
/// padded scratch buffer and the real elements are copied back afterwards.
pub(crate) fn merge_sort<T: Element>(v: &mut [T]) -> Result<()> {
    let len = v.len();
    if len <= 4 * T::BLOCK {
        small_sort(v);
        return Ok(());
    }

    let padded = round_up_to_block::<T>(len);
    if padded == len && is_block_aligned(v.as_ptr()) {
        debug!("merge sort of {len} elements in place");
        return with_scratch::<T, _, _>(0, len, |_, work| merge_sort_blocks(v, work));
    }

    debug!("merge sort of {len} elements through {padded} elements of scratch");
    with_scratch::<T, _, _>(padded, padded, |data, work| {
        data[..len].copy_from_slice(v);
        data[len..].fill(T::SENTINEL);
        merge_sort_blocks(data, work);
        v.copy_from_slice(&data[..len]);
    })
}
