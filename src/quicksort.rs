//! Block quicksort.
//!
//! The slice is viewed as a misaligned head fragment (`lead`), a run of aligned blocks and a
//! tail fragment. All aligned blocks are sorted first, and from then on every step keeps them
//! individually sorted: partitioning merges a block from each end against each other and
//! commits whole blocks to either side of the pivot. The fragments are folded into the
//! partition by swapping them against the extreme elements of the outermost blocks.

use core::ptr;

use log::{debug, trace};

use crate::dispatch::{merge_sort, small_sort};
use crate::element::Element;
use crate::error::Result;
use crate::kernel::{load_block, sort_1u, sort_2u, sort_block_regs, store_block};
use crate::lanes::Lanes;
use crate::merge::merge_blocks;
use crate::pivot;
use crate::scratch::BLOCK_ALIGN;

// Ranges of at most this many aligned blocks are sorted by bubble merging.
const BUBBLE_MERGE_MAX_BLOCKS: usize = 8;

// Fragment ranges with fewer aligned blocks than this are left for the final small sorts.
const FRAGMENT_LEAF_BLOCKS: usize = 4;

/// Layout of a slice relative to the block grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BlockRange {
    /// Elements before the first aligned block.
    pub(crate) lead: usize,
    /// Whole aligned blocks.
    pub(crate) blocks: usize,
    /// Elements after the last aligned block.
    pub(crate) tail: usize,
}

impl BlockRange {
    pub(crate) fn of<T: Element>(v: &[T]) -> Self {
        let len = v.len();
        let lead = v.as_ptr().align_offset(BLOCK_ALIGN).min(len);
        let blocks = (len - lead) / T::BLOCK;
        let tail = len - lead - blocks * T::BLOCK;
        BlockRange { lead, blocks, tail }
    }

    #[inline]
    fn has_fragments(&self) -> bool {
        self.lead > 0 || self.tail > 0
    }
}

/// Unsorted ranges left at the two ends of a slice by the fragment entry, as element counts from
/// the start and from the end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Fragments {
    pub(crate) left: usize,
    pub(crate) right: usize,
}

/// Sorts `v` with the block quicksort, falling back to the merge sort where partitioning makes
/// no progress.
pub(crate) fn quick_sort<T: Element>(v: &mut [T]) -> Result<()> {
    let u = T::BLOCK;
    let len = v.len();
    if len <= 4 * u {
        small_sort(v);
        return Ok(());
    }

    let range = BlockRange::of(v);
    if range.blocks < 4 {
        return merge_sort(v);
    }

    // SAFETY: the aligned blocks lie inside `v`, each kernel stays within its own blocks.
    unsafe {
        let base = v.as_mut_ptr().add(range.lead);
        let mut i = 0;
        while i + 1 < range.blocks {
            sort_2u(base.add(i * u), base.add(i * u));
            i += 2;
        }
        if i < range.blocks {
            sort_1u(base.add(i * u), base.add(i * u));
        }
    }

    // Limit the number of imbalanced partitions to `2 * floor(log2(blocks))`.
    let limit = 2 * (range.blocks | 1).ilog2();

    if !range.has_fragments() {
        return quicksort_aligned(v, limit);
    }

    let fragments = quicksort_fragments(v, limit)?;
    trace!("deferred fragments {fragments:?} of {len} elements");
    small_sort(&mut v[..fragments.left]);
    small_sort(&mut v[len - fragments.right..]);
    Ok(())
}

/// Sorts `v`, a whole number of aligned and individually sorted blocks.
///
/// `limit` is the number of allowed imbalanced partitions before switching to the merge sort.
fn quicksort_aligned<'a, T: Element>(mut v: &'a mut [T], mut limit: u32) -> Result<()> {
    let u = T::BLOCK;
    loop {
        let blocks = v.len() / u;
        debug_assert!(v.len() % u == 0);

        if blocks <= BUBBLE_MERGE_MAX_BLOCKS {
            bubble_merge(v);
            return Ok(());
        }

        if limit == 0 {
            debug!("partition limit reached at {blocks} blocks, merge sort");
            return merge_sort(v);
        }
        limit -= 1;

        let Some(pivot) = pivot::choose(v)? else {
            debug!("no pivot for {blocks} blocks, merge sort");
            return merge_sort(v);
        };

        let range = BlockRange {
            lead: 0,
            blocks,
            tail: 0,
        };
        let m = match partition(v, range, pivot) {
            Some(m) if m > 0 && m + 1 < blocks => m,
            m => {
                debug!("degenerate partition {m:?} of {blocks} blocks, merge sort");
                return merge_sort(v);
            }
        };

        // Block `m` straddles the split and is sorted as part of both sides.
        quicksort_aligned(&mut v[..(m + 1) * u], limit)?;

        let rest = v;
        v = &mut rest[m * u..];
    }
}

/// Sorts `v`, which starts and/or ends with a fragment, except for the returned fragment ranges.
///
/// The returned ranges are left for the caller to small-sort, left range first.
fn quicksort_fragments<T: Element>(v: &mut [T], mut limit: u32) -> Result<Fragments> {
    let u = T::BLOCK;
    let range = BlockRange::of(v);
    let both = range.lead > 0 && range.tail > 0;

    if range.blocks < FRAGMENT_LEAF_BLOCKS && !both {
        return Ok(if range.lead > 0 {
            Fragments {
                left: v.len(),
                right: 0,
            }
        } else {
            Fragments {
                left: 0,
                right: v.len(),
            }
        });
    }

    if limit == 0 {
        debug!("partition limit reached at {} elements, merge sort", v.len());
        merge_sort(v)?;
        return Ok(Fragments::default());
    }
    limit -= 1;

    let aligned = &mut v[range.lead..range.lead + range.blocks * u];
    let m = match pivot::choose(aligned)? {
        Some(pivot) => partition(v, range, pivot),
        None => None,
    };
    let m = match m {
        Some(m) if m > 0 && m + 1 < range.blocks => m,
        m => {
            debug!("degenerate partition {m:?} of {range:?}, merge sort");
            merge_sort(v)?;
            return Ok(Fragments::default());
        }
    };

    let split = range.lead + m * u;

    let right = &mut v[split..];
    let right = if range.tail > 0 {
        quicksort_fragments(right, limit)?.right
    } else {
        quicksort_aligned(right, limit)?;
        0
    };

    let left = &mut v[..split + u];
    let left = if range.lead > 0 {
        quicksort_fragments(left, limit)?.left
    } else {
        quicksort_aligned(left, limit)?;
        0
    };

    Ok(Fragments { left, right })
}

/// Sorts a few aligned, individually sorted blocks by repeatedly merging the highest block
/// towards the end.
fn bubble_merge<T: Element>(v: &mut [T]) {
    let u = T::BLOCK;
    let blocks = v.len() / u;
    let base = v.as_mut_ptr();

    // SAFETY: every block index is below `blocks`, so all loads and stores stay in `v`.
    unsafe {
        for end in (2..=blocks).rev() {
            let mut carry = load_block::<T>(base);
            for j in 1..end {
                let mut lo = load_block::<T>(base.add(j * u));
                merge_blocks(&mut lo, &mut carry);
                store_block::<T>(base.add((j - 1) * u), &lo);
            }
            store_block::<T>(base.add((end - 1) * u), &carry);
        }
    }
}

/// Partitions the individually sorted blocks of `v` around `pivot`, folding the fragments of
/// `range` in on the way.
///
/// Returns the index `m` of the block straddling the split. Afterwards every element of the
/// lead and of the blocks before `m` is `<= pivot`, every element of the blocks after `m` and of
/// the tail is `>= pivot`, and every block is sorted. Returns `None` if a fragment could not be
/// folded; `v` is then still a permutation of its input.
fn partition<T: Element>(v: &mut [T], range: BlockRange, pivot: T) -> Option<usize> {
    let u = T::BLOCK;
    let BlockRange { lead, blocks, tail } = range;
    debug_assert!(blocks >= 2);
    debug_assert_eq!(v.len(), lead + blocks * u + tail);

    let start = v.as_mut_ptr();

    // SAFETY: `l` and `r` stay within `0..blocks`, the fragments are the `lead` elements before
    // the first block and the `tail` elements after the last one, and the fragments never
    // overlap the block elements they are swapped with.
    let m = unsafe {
        let base = start.add(lead);
        let block = |i: usize| base.add(i * u);
        let end = block(blocks);

        let mut lead_pending = lead > 0;
        let mut tail_pending = tail > 0;

        let (mut l, mut r) = (0, blocks - 1);
        let mut lo = load_block::<T>(block(l));
        let mut hi = load_block::<T>(block(r));

        loop {
            merge_blocks(&mut lo, &mut hi);

            if !pivot.is_less(&lo[3].last()) {
                store_block::<T>(block(l), &lo);
                if lead_pending && l == 0 {
                    ptr::swap_nonoverlapping(start, base, lead);
                    lo = load_block::<T>(base);
                    sort_block_regs::<T>(&mut lo);
                    lead_pending = false;
                } else {
                    l += 1;
                    if l == r {
                        store_block::<T>(block(r), &hi);
                        break;
                    }
                    lo = load_block::<T>(block(l));
                }
            }

            if !hi[0].first().is_less(&pivot) {
                store_block::<T>(block(r), &hi);
                if tail_pending && r == blocks - 1 {
                    ptr::swap_nonoverlapping(end.sub(tail), end, tail);
                    hi = load_block::<T>(block(r));
                    sort_block_regs::<T>(&mut hi);
                    tail_pending = false;
                } else {
                    r -= 1;
                    if l == r {
                        store_block::<T>(block(l), &lo);
                        break;
                    }
                    hi = load_block::<T>(block(r));
                }
            }
        }

        if lead_pending || tail_pending {
            debug!("partition left a fragment unfolded, lead {lead_pending}, tail {tail_pending}");
            return None;
        }
        l
    };

    trace!("partition of {blocks} blocks at block {m}");
    Some(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scratch::AlignedBuf;
    use rand::prelude::*;

    fn buf_from<T: Element>(input: &[T]) -> AlignedBuf<T> {
        let mut buf = AlignedBuf::<T>::new(input.len()).unwrap();
        buf.as_mut_slice().copy_from_slice(input);
        buf
    }

    fn presort_blocks<T: Element>(v: &mut [T]) {
        let range = BlockRange::of(v);
        let aligned = &mut v[range.lead..range.lead + range.blocks * T::BLOCK];
        for block in aligned.chunks_exact_mut(T::BLOCK) {
            let ptr = block.as_mut_ptr();
            // SAFETY: `block` is an aligned block.
            unsafe { sort_1u(ptr, ptr) };
        }
    }

    fn sorted_copy(v: &[i32]) -> Vec<i32> {
        let mut v = v.to_vec();
        v.sort_unstable();
        v
    }

    #[test]
    fn block_range_of_subslices() {
        let mut buf = AlignedBuf::<i32>::new(100).unwrap();
        let range = |lead, blocks, tail| BlockRange { lead, blocks, tail };

        let v = buf.as_mut_slice();
        assert_eq!(BlockRange::of(&v[..]), range(0, 3, 4));
        assert_eq!(BlockRange::of(&v[3..]), range(5, 2, 28));
        assert_eq!(BlockRange::of(&v[1..5]), range(4, 0, 0));

        let mut buf = AlignedBuf::<f64>::new(40).unwrap();
        let v = buf.as_mut_slice();
        assert_eq!(BlockRange::of(&v[1..]), range(3, 2, 4));
    }

    #[test]
    fn bubble_merge_sorts_sorted_blocks() {
        let mut rng = StdRng::seed_from_u64(21);
        for blocks in 1..=BUBBLE_MERGE_MAX_BLOCKS {
            let input: Vec<i32> = (0..blocks * i32::BLOCK)
                .map(|_| rng.gen_range(-50..50))
                .collect();
            let mut buf = buf_from(&input);
            presort_blocks(buf.as_mut_slice());
            bubble_merge(buf.as_mut_slice());
            assert_eq!(buf.as_mut_slice().to_vec(), sorted_copy(&input), "{blocks} blocks");
        }
    }

    fn check_partition(v: &[i32], range: BlockRange, pivot: i32, m: usize) {
        let u = i32::BLOCK;
        let blocks = &v[range.lead..range.lead + range.blocks * u];
        assert!(m < range.blocks);
        assert!(v[..range.lead].iter().all(|&x| x <= pivot), "lead");
        assert!(v[v.len() - range.tail..].iter().all(|&x| x >= pivot), "tail");
        for (i, block) in blocks.chunks_exact(u).enumerate() {
            assert!(block.windows(2).all(|w| w[0] <= w[1]), "block {i} unsorted");
            if i < m {
                assert!(block.iter().all(|&x| x <= pivot), "block {i} left of {m}");
            } else if i > m {
                assert!(block.iter().all(|&x| x >= pivot), "block {i} right of {m}");
            }
        }
    }

    #[test]
    fn partition_splits_aligned_blocks() {
        let mut rng = StdRng::seed_from_u64(22);
        let input: Vec<i32> = (0..24 * i32::BLOCK).map(|_| rng.gen_range(0..10_000)).collect();
        let mut buf = buf_from(&input);
        let v = buf.as_mut_slice();
        presort_blocks(v);

        let range = BlockRange::of(v);
        let m = partition(v, range, 5_000).unwrap();
        check_partition(v, range, 5_000, m);
        assert_eq!(sorted_copy(v), sorted_copy(&input));
    }

    #[test]
    fn partition_folds_fragments() {
        let mut rng = StdRng::seed_from_u64(23);
        let mut buf = AlignedBuf::<i32>::new(30 * i32::BLOCK).unwrap();
        for offset in 1..8 {
            let v = &mut buf.as_mut_slice()[offset..offset + 20 * i32::BLOCK + 13];
            for x in v.iter_mut() {
                *x = rng.gen_range(0..10_000);
            }
            let input = v.to_vec();
            presort_blocks(v);

            let range = BlockRange::of(v);
            assert!(range.lead > 0 && range.tail > 0);
            let m = partition(v, range, 5_000).unwrap();
            check_partition(v, range, 5_000, m);
            assert_eq!(sorted_copy(v), sorted_copy(&input), "offset {offset}");
        }
    }

    #[test]
    fn partition_reports_an_unfoldable_lead() {
        let mut buf = AlignedBuf::<i32>::new(10 * i32::BLOCK).unwrap();
        let v = &mut buf.as_mut_slice()[2..];
        for (i, x) in v.iter_mut().enumerate() {
            *x = i as i32 + 1;
        }
        let input = v.to_vec();
        presort_blocks(v);

        let range = BlockRange::of(v);
        assert_eq!(partition(v, range, i32::MIN), None);
        assert_eq!(sorted_copy(v), input);
    }

    #[test]
    fn quick_sort_handles_misaligned_subslices() {
        let mut rng = StdRng::seed_from_u64(24);
        let len = 3_000;
        let mut buf = AlignedBuf::<i32>::new(len + 64).unwrap();
        for offset in 0..32 {
            let all = buf.as_mut_slice();
            for x in all.iter_mut() {
                *x = rng.gen_range(-1_000..1_000);
            }
            let before = all.to_vec();

            let v = &mut all[offset..offset + len];
            quick_sort(v).unwrap();

            let all = buf.as_mut_slice();
            assert_eq!(all[..offset], before[..offset], "offset {offset}");
            assert_eq!(all[offset + len..], before[offset + len..], "offset {offset}");
            assert_eq!(all[offset..offset + len], sorted_copy(&before[offset..offset + len])[..]);
        }
    }

    #[test]
    fn quick_sort_duplicates_and_equal_runs() {
        for len in [129, 300, 1_000, 10_000] {
            let mut v = vec![7i32; len];
            quick_sort(&mut v).unwrap();
            assert!(v.iter().all(|&x| x == 7));

            let mut v: Vec<i32> = (0..len).map(|i| (i % 3) as i32).collect();
            let expected = sorted_copy(&v);
            quick_sort(&mut v).unwrap();
            assert_eq!(v, expected);
        }
    }

    #[test]
    fn quick_sort_f64_with_nan_and_zeros() {
        let mut rng = StdRng::seed_from_u64(25);
        let specials = [
            f64::NAN,
            -f64::NAN,
            0.0,
            -0.0,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::SENTINEL,
        ];
        let mut v: Vec<f64> = (0..5_001)
            .map(|i| {
                if i % 17 == 0 {
                    specials[i % specials.len()]
                } else {
                    rng.gen::<f64>() - 0.5
                }
            })
            .collect();
        let mut expected = v.clone();
        expected.sort_by(f64::total_cmp);

        quick_sort(&mut v).unwrap();
        assert!(v.iter().zip(expected.iter()).all(|(a, b)| a.to_bits() == b.to_bits()));
    }
}
