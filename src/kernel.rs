//! Fixed-size block sort kernels.
//!
//! Every kernel works on the lane set: eight registers, two blocks. The eight registers are first
//! sorted column-wise by an odd-even network, transposed so that every column becomes a
//! contiguous sorted run, and then merged pairwise with bitonic merges until a single sorted run
//! of two blocks remains.

use core::array;

use crate::element::{Element, Reg};
use crate::lanes::{exchange_at, Lanes};
use crate::merge::{merge_blocks, merge_regs};

/// One block held in registers.
pub(crate) type Block<V> = [V; 4];

/// Batcher's odd-even merge sort network for 8 inputs.
const ODD_EVEN_8: [(usize, usize); 19] = [
    (0, 1),
    (2, 3),
    (4, 5),
    (6, 7),
    (0, 2),
    (1, 3),
    (4, 6),
    (5, 7),
    (1, 2),
    (5, 6),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
    (2, 4),
    (3, 5),
    (1, 2),
    (3, 4),
    (5, 6),
];

/// # Safety
///
/// `src` must be block aligned and valid for reading one block.
#[inline(always)]
pub(crate) unsafe fn load_block<T: Element>(src: *const T) -> Block<Reg<T>> {
    // SAFETY: see function safety.
    array::from_fn(|i| unsafe { Reg::<T>::load(src.add(i * T::LANES)) })
}

/// # Safety
///
/// `dst` must be block aligned and valid for writing one block.
#[inline(always)]
pub(crate) unsafe fn store_block<T: Element>(dst: *mut T, regs: &[Reg<T>]) {
    for (i, reg) in regs.iter().enumerate() {
        reg.store(dst.add(i * T::LANES));
    }
}

/// Rearranges the lane set so that column `c` (lane `c` of every register, top to bottom) ends
/// up as the contiguous elements `8c..8c + 8`.
///
/// Each round is a perfect shuffle of the whole lane set, i.e. a rotation of the element index
/// bits. Three rounds rotate the three register-index bits below the lane-index bits.
#[inline(always)]
fn transpose<V: Lanes>(regs: &mut [V; 8]) {
    for _ in 0..3 {
        let src = *regs;
        for i in 0..4 {
            let (lo, hi) = V::zip(src[i], src[i + 4]);
            regs[2 * i] = lo;
            regs[2 * i + 1] = hi;
        }
    }
}

/// Sorts the lane set, two blocks, entirely in registers.
#[inline(always)]
pub(crate) fn sort_regs<V: Lanes>(regs: &mut [V; 8]) {
    for &(lo, hi) in ODD_EVEN_8.iter() {
        exchange_at(regs, lo, hi);
    }

    transpose(regs);

    // Runs of 8 elements, doubled by every merge round.
    let mut run = 8 / V::WIDTH;
    while run < 8 {
        for pair in regs.chunks_exact_mut(2 * run) {
            let (a, b) = pair.split_at_mut(run);
            merge_regs(a, b);
        }
        run *= 2;
    }
}

/// Sorts a single block held in registers, padding the lane set with the sentinel.
#[inline(always)]
pub(crate) fn sort_block_regs<T: Element>(block: &mut Block<Reg<T>>) {
    let mut regs = [Reg::<T>::splat(T::SENTINEL); 8];
    regs[..4].copy_from_slice(block);
    sort_regs(&mut regs);
    block.copy_from_slice(&regs[..4]);
}

#[inline(always)]
unsafe fn load_pair<T: Element>(src: *const T) -> [Reg<T>; 8] {
    // SAFETY: see the callers' safety sections.
    array::from_fn(|i| unsafe { Reg::<T>::load(src.add(i * T::LANES)) })
}

// All kernels read their whole input before the first store, so `src` and `dst` may be the same
// pointer.

/// Sorts one block.
///
/// # Safety
///
/// `src` and `dst` must be block aligned, valid for one block, and either equal or disjoint.
pub(crate) unsafe fn sort_1u<T: Element>(src: *const T, dst: *mut T) {
    let mut block = load_block::<T>(src);
    sort_block_regs::<T>(&mut block);
    store_block::<T>(dst, &block);
}

/// Sorts two blocks.
///
/// # Safety
///
/// `src` and `dst` must be block aligned, valid for two blocks, and either equal or disjoint.
pub(crate) unsafe fn sort_2u<T: Element>(src: *const T, dst: *mut T) {
    let mut regs = load_pair::<T>(src);
    sort_regs(&mut regs);
    store_block::<T>(dst, &regs);
}

/// Sorts three blocks.
///
/// # Safety
///
/// `src` and `dst` must be block aligned, valid for three blocks, and either equal or disjoint.
pub(crate) unsafe fn sort_3u<T: Element>(src: *const T, dst: *mut T) {
    let u = T::BLOCK;
    let mut front = load_pair::<T>(src);
    let third = load_block::<T>(src.add(2 * u));

    sort_regs(&mut front);
    let (low, mid) = front.split_at_mut(4);

    // The top block of all three is the top block of `mid` merged with the unsorted third one,
    // since every element of `low` has a full block of elements above it.
    let mut back = [mid[0], mid[1], mid[2], mid[3], third[0], third[1], third[2], third[3]];
    sort_regs(&mut back);
    let (mid, high) = back.split_at_mut(4);

    merge_regs(low, mid);

    store_block::<T>(dst, low);
    store_block::<T>(dst.add(u), mid);
    store_block::<T>(dst.add(2 * u), high);
}

/// Sorts four blocks.
///
/// # Safety
///
/// `src` and `dst` must be block aligned, valid for four blocks, and either equal or disjoint.
pub(crate) unsafe fn sort_4u<T: Element>(src: *const T, dst: *mut T) {
    let u = T::BLOCK;
    let mut front = load_pair::<T>(src);
    let mut back = load_pair::<T>(src.add(2 * u));

    sort_regs(&mut front);
    sort_regs(&mut back);

    let mut b0: Block<Reg<T>> = array::from_fn(|i| front[i]);
    let mut b1: Block<Reg<T>> = array::from_fn(|i| front[4 + i]);
    let mut b2: Block<Reg<T>> = array::from_fn(|i| back[i]);
    let mut b3: Block<Reg<T>> = array::from_fn(|i| back[4 + i]);

    // Lowest and highest blocks first, then the two in the middle.
    merge_blocks(&mut b0, &mut b2);
    merge_blocks(&mut b1, &mut b3);
    merge_blocks(&mut b2, &mut b1);

    store_block::<T>(dst, &b0);
    store_block::<T>(dst.add(u), &b2);
    store_block::<T>(dst.add(2 * u), &b1);
    store_block::<T>(dst.add(3 * u), &b3);
}
