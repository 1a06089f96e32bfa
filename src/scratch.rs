//! Block-aligned scratch memory.

use core::mem;
use core::ptr::NonNull;
use core::slice;
use std::alloc::{self, Layout};
use std::sync::TryLockError;

use log::debug;

use crate::element::Element;
use crate::error::{Result, SortError};

/// Alignment of every block, the width of one register in bytes.
pub(crate) const BLOCK_ALIGN: usize = 32;

/// Zero-initialized heap buffer aligned to [`BLOCK_ALIGN`].
///
/// Zero is a valid value of every [`Element`], so the buffer is always fully initialized.
pub struct AlignedBuf<T> {
    ptr: NonNull<T>,
    len: usize,
}

// SAFETY: `AlignedBuf` owns its allocation exclusively, like `Box<[T]>`.
unsafe impl<T: Send> Send for AlignedBuf<T> {}

impl<T: Element> AlignedBuf<T> {
    pub fn empty() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
        }
    }

    pub fn new(len: usize) -> Result<Self> {
        if len == 0 {
            return Ok(Self::empty());
        }

        let layout = Self::layout(len)?;
        // SAFETY: `layout` has a non-zero size because `len > 0` and `T` is not zero-sized.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw.cast::<T>()).ok_or(SortError::Allocation {
            bytes: layout.size(),
        })?;

        Ok(Self { ptr, len })
    }

    fn layout(len: usize) -> Result<Layout> {
        let bytes = len
            .checked_mul(mem::size_of::<T>())
            .ok_or(SortError::Overflow { len })?;
        Layout::from_size_align(bytes, BLOCK_ALIGN).map_err(|_| SortError::Overflow { len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: `ptr` is valid for `len` initialized elements, or dangling with `len == 0`.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T> Drop for AlignedBuf<T> {
    fn drop(&mut self) {
        if self.len == 0 {
            return;
        }
        // SAFETY: the allocation was made in `new` with exactly this layout, which was checked
        // to be valid there.
        unsafe {
            let size = self.len * mem::size_of::<T>();
            let layout = Layout::from_size_align_unchecked(size, BLOCK_ALIGN);
            alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), layout);
        }
    }
}

/// Two reusable scratch buffers that only ever grow.
pub struct ScratchPair<T> {
    data: AlignedBuf<T>,
    work: AlignedBuf<T>,
}

impl<T: Element> ScratchPair<T> {
    pub fn new() -> Self {
        Self {
            data: AlignedBuf::empty(),
            work: AlignedBuf::empty(),
        }
    }

    fn reserve(&mut self, data_len: usize, work_len: usize) -> Result<()> {
        if self.data.len() < data_len {
            debug!("growing cached scratch to {data_len} elements");
            self.data = AlignedBuf::new(data_len)?;
        }
        if self.work.len() < work_len {
            self.work = AlignedBuf::new(work_len)?;
        }
        Ok(())
    }

    fn split(&mut self, data_len: usize, work_len: usize) -> (&mut [T], &mut [T]) {
        (
            &mut self.data.as_mut_slice()[..data_len],
            &mut self.work.as_mut_slice()[..work_len],
        )
    }
}

/// Runs `f` with two block-aligned scratch slices of exactly `data_len` and `work_len` elements.
///
/// Types with a process-wide cache borrow it when it is free; otherwise the buffers are allocated
/// for this call and released when it returns. The contents of both slices are unspecified.
pub(crate) fn with_scratch<T, R, F>(data_len: usize, work_len: usize, f: F) -> Result<R>
where
    T: Element,
    F: FnOnce(&mut [T], &mut [T]) -> R,
{
    if let Some(cache) = T::scratch_cache() {
        let guard = match cache.try_lock() {
            Ok(guard) => Some(guard),
            // The buffers carry no state between calls, a panic mid-sort leaves nothing to repair.
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => {
                debug!("scratch cache is busy, allocating {work_len} elements for this call");
                None
            }
        };

        if let Some(mut pair) = guard {
            pair.reserve(data_len, work_len)?;
            let (data, work) = pair.split(data_len, work_len);
            return Ok(f(data, work));
        }
    }

    let mut data = AlignedBuf::<T>::new(data_len)?;
    let mut work = AlignedBuf::<T>::new(work_len)?;
    Ok(f(data.as_mut_slice(), work.as_mut_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_are_block_aligned_and_zeroed() {
        for len in [1, 7, 32, 1000] {
            let mut buf = AlignedBuf::<u32>::new(len).unwrap();
            let slice = buf.as_mut_slice();
            assert_eq!(slice.as_ptr() as usize % BLOCK_ALIGN, 0);
            assert_eq!(slice.len(), len);
            assert!(slice.iter().all(|&x| x == 0));
        }
        assert_eq!(AlignedBuf::<f64>::new(0).unwrap().len(), 0);
    }

    #[test]
    fn oversized_request_is_reported() {
        let len = usize::MAX / 4;
        let err = AlignedBuf::<f64>::new(len).err();
        assert_eq!(err, Some(SortError::Overflow { len }));
    }

    #[test]
    fn scratch_slices_have_requested_lengths() {
        let lens = with_scratch::<f64, _, _>(48, 64, |data, work| {
            assert_eq!(data.as_ptr() as usize % BLOCK_ALIGN, 0);
            assert_eq!(work.as_ptr() as usize % BLOCK_ALIGN, 0);
            (data.len(), work.len())
        })
        .unwrap();
        assert_eq!(lens, (48, 64));

        let lens = with_scratch::<i32, _, _>(0, 96, |data, work| (data.len(), work.len())).unwrap();
        assert_eq!(lens, (0, 96));
    }

    #[test]
    fn cached_pair_never_shrinks() {
        let mut pair = ScratchPair::<f64>::new();
        pair.reserve(64, 128).unwrap();
        pair.reserve(16, 16).unwrap();
        assert_eq!((pair.data.len(), pair.work.len()), (64, 128));
    }
}
