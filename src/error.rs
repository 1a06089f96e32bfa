use thiserror::Error;

/// Failures the sort entry points can report.
///
/// Sorting itself cannot fail: every element value is valid input. Errors come only from the
/// buffer handed in through [`try_sort_raw`](crate::try_sort_raw) or from acquiring scratch
/// memory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SortError {
    /// The raw pointer is not aligned even for a single element.
    #[error("buffer at {addr:#x} is not aligned to {align} bytes")]
    Misaligned { addr: usize, align: usize },

    /// Aligned scratch memory could not be allocated.
    #[error("failed to allocate {bytes} bytes of aligned scratch memory")]
    Allocation { bytes: usize },

    /// The scratch size for `len` elements does not fit in a memory layout.
    #[error("scratch for {len} elements exceeds the addressable size")]
    Overflow { len: usize },
}

pub type Result<T> = std::result::Result<T, SortError>;
