//! Bitonic merging of sorted register runs, and the block-at-a-time merge of sorted block runs
//! built on top of it.

use crate::element::Element;
use crate::kernel::{load_block, store_block, Block};
use crate::lanes::{exchange_at, Lanes};

/// Merges two sorted runs of `n` registers each. Afterwards `a` holds the lower `n` registers of
/// the merged run and `b` the upper, both sorted.
///
/// `a` is compared against the reversed `b`, which turns each half into a bitonic sequence whose
/// elements are all on the correct side of the split. The halves are then cleaned independently.
#[inline(always)]
pub(crate) fn merge_regs<V: Lanes>(a: &mut [V], b: &mut [V]) {
    debug_assert_eq!(a.len(), b.len());

    b.reverse();
    for (lo, hi) in a.iter_mut().zip(b.iter_mut()) {
        *hi = hi.reverse();
        V::compare_exchange(lo, hi);
    }

    bitonic_clean(a);
    bitonic_clean(b);
}

/// Sorts a bitonic run of registers: cross-register half cleaners first, then the strides within
/// each register.
#[inline(always)]
fn bitonic_clean<V: Lanes>(regs: &mut [V]) {
    let n = regs.len();

    let mut step = n / 2;
    while step > 0 {
        for i in 0..n {
            if i & step == 0 {
                exchange_at(regs, i, i + step);
            }
        }
        step /= 2;
    }

    for reg in regs.iter_mut() {
        let mut stride = V::WIDTH / 2;
        while stride > 0 {
            *reg = reg.intra_compare(stride);
            stride /= 2;
        }
    }
}

/// The block merge primitive: two sorted blocks in, lower block in `lo` and upper in `hi` out.
#[inline(always)]
pub(crate) fn merge_blocks<V: Lanes>(lo: &mut Block<V>, hi: &mut Block<V>) {
    merge_regs(lo, hi);
}

/// Merges the sorted runs `a` (`a_blocks` blocks) and `b` (`b_blocks` blocks) into `dst`.
///
/// The merge advances one block at a time: the highest block of the previous step is carried in
/// registers and merged with the next block from whichever run has the smaller head.
///
/// # Safety
///
/// `a`, `b` and `dst` must be block aligned. Both runs must hold at least one block and be valid
/// for reads, `dst` must be valid for writes of `a_blocks + b_blocks` blocks and must not overlap
/// either run.
pub(crate) unsafe fn merge_runs<T: Element>(
    mut a: *const T,
    a_blocks: usize,
    mut b: *const T,
    b_blocks: usize,
    mut dst: *mut T,
) {
    debug_assert!(a_blocks > 0 && b_blocks > 0);
    let u = T::BLOCK;

    let mut lo = load_block::<T>(a);
    let mut carry = load_block::<T>(b);
    merge_blocks(&mut lo, &mut carry);
    store_block::<T>(dst, &lo);

    a = a.add(u);
    b = b.add(u);
    dst = dst.add(u);

    let (mut i, mut j) = (1, 1);
    while i != a_blocks || j != b_blocks {
        // SAFETY: `a` and `b` are only dereferenced while their run has blocks left.
        let take_b = i == a_blocks || (j != b_blocks && (*b).is_less(&*a));
        let next = if take_b {
            let next = b;
            b = b.add(u);
            j += 1;
            next
        } else {
            let next = a;
            a = a.add(u);
            i += 1;
            next
        };

        let mut lo = load_block::<T>(next);
        merge_blocks(&mut lo, &mut carry);
        store_block::<T>(dst, &lo);
        dst = dst.add(u);
    }

    store_block::<T>(dst, &carry);
}
