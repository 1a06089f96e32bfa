use crate::element::Element;
use crate::kernel::{sort_1u, sort_2u, sort_3u, sort_4u};
use crate::merge::merge_runs;

/// Sorts `data`, a whole number of aligned blocks, using `scratch` of at least the same length.
pub(crate) fn merge_sort_blocks<T: Element>(data: &mut [T], scratch: &mut [T]) {
    let u = T::BLOCK;
    let len = data.len();
    assert!(len % u == 0 && scratch.len() >= len);
    debug_assert!(data.as_ptr() as usize % crate::scratch::BLOCK_ALIGN == 0);
    debug_assert!(scratch.as_ptr() as usize % crate::scratch::BLOCK_ALIGN == 0);

    if len == 0 {
        return;
    }

    let data = data.as_mut_ptr();
    // SAFETY: `data` and `scratch` are distinct, block aligned and hold `len / u` blocks, which
    // is all `sort_rec` touches.
    unsafe { sort_rec(scratch.as_mut_ptr(), data, data, len / u) };
}

/// Sorts `count` blocks read from `org` into `dst`, using `src` as the second buffer.
///
/// The recursion ping-pongs: each half is sorted into `src` with the roles of `src` and `dst`
/// swapped, then both halves are merged from `src` into `dst`. The base cases read straight from
/// `org`, so no level ever copies.
///
/// # Safety
///
/// All three pointers must be block aligned and valid for `count` blocks. `src` and `dst` must not
/// overlap, `org` may be equal to either of them.
unsafe fn sort_rec<T: Element>(src: *mut T, dst: *mut T, org: *const T, count: usize) {
    match count {
        1 => sort_1u(org, dst),
        2 => sort_2u(org, dst),
        3 => sort_3u(org, dst),
        4 => sort_4u(org, dst),
        _ => {
            let half = count / 2;
            let offset = half * T::BLOCK;

            sort_rec(dst, src, org, half);
            sort_rec(dst.add(offset), src.add(offset), org.add(offset), count - half);
            merge_runs(src, half, src.add(offset), count - half, dst);
        }
    }
}
