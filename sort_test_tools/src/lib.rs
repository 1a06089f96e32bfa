//! Shared test harness for the sort implementations.
//!
//! An implementation under test provides a [`Sort`] impl and calls [`instantiate_sort_tests!`],
//! which expands into one `#[test]` per test function and element type.

use std::cmp::Ordering;
use std::env;
use std::fmt::Debug;

use once_cell::sync::Lazy;

pub mod patterns;
pub mod tests;

#[doc(hidden)]
pub use paste;

/// A sort implementation under test.
pub trait Sort<T> {
    fn name() -> String;

    fn sort(arr: &mut [T]);
}

/// Element types the tests are generated for.
pub trait TestElem: Copy + Debug + 'static {
    /// Order preserving mapping from the `i32` patterns.
    fn from_i32(val: i32) -> Self;

    /// The greatest value under the sort order, i.e. the value used as padding.
    fn greatest() -> Self;

    /// Values that tend to break comparisons written for the common case.
    fn specials() -> Vec<Self>;

    fn total_cmp(&self, other: &Self) -> Ordering;
}

impl TestElem for i32 {
    fn from_i32(val: i32) -> Self {
        val
    }

    fn greatest() -> Self {
        i32::MAX
    }

    fn specials() -> Vec<Self> {
        vec![i32::MIN, i32::MIN + 1, -1, 0, 1, i32::MAX - 1, i32::MAX]
    }

    fn total_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl TestElem for u32 {
    fn from_i32(val: i32) -> Self {
        (val as u32) ^ 0x8000_0000
    }

    fn greatest() -> Self {
        u32::MAX
    }

    fn specials() -> Vec<Self> {
        vec![0, 1, 0x7FFF_FFFF, 0x8000_0000, u32::MAX - 1, u32::MAX]
    }

    fn total_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl TestElem for f64 {
    fn from_i32(val: i32) -> Self {
        val as f64
    }

    fn greatest() -> Self {
        f64::from_bits(0x7FFF_FFFF_FFFF_FFFF)
    }

    fn specials() -> Vec<Self> {
        vec![
            f64::NAN,
            -f64::NAN,
            f64::INFINITY,
            f64::NEG_INFINITY,
            0.0,
            -0.0,
            f64::MIN_POSITIVE,
            f64::MAX,
            f64::MIN,
            Self::greatest(),
        ]
    }

    fn total_cmp(&self, other: &Self) -> Ordering {
        f64::total_cmp(self, other)
    }
}

static SEED: Lazy<u64> = Lazy::new(|| {
    env::var("OVERRIDE_SEED")
        .ok()
        .map(|seed| {
            seed.parse::<u64>()
                .unwrap_or_else(|_| panic!("OVERRIDE_SEED is not a u64: {seed}"))
        })
        .unwrap_or_else(rand::random)
});

/// Seed shared by all tests of one run. Set `OVERRIDE_SEED` to reproduce a failure.
pub fn random_init_seed() -> u64 {
    *SEED
}

#[macro_export]
macro_rules! instantiate_sort_test_inner {
    ($sort_impl:ty, $test_fn:ident) => {
        $crate::paste::paste! {
            #[test]
            fn [<$test_fn _i32>]() {
                $crate::tests::$test_fn::<i32, $sort_impl>();
            }

            #[test]
            fn [<$test_fn _u32>]() {
                $crate::tests::$test_fn::<u32, $sort_impl>();
            }

            #[test]
            fn [<$test_fn _f64>]() {
                $crate::tests::$test_fn::<f64, $sort_impl>();
            }
        }
    };
}

#[macro_export]
macro_rules! instantiate_sort_tests {
    ($sort_impl:ty) => {
        $crate::instantiate_sort_test_inner!($sort_impl, basic);
        $crate::instantiate_sort_test_inner!($sort_impl, scenario);
        $crate::instantiate_sort_test_inner!($sort_impl, reverse_64);
        $crate::instantiate_sort_test_inner!($sort_impl, random);
        $crate::instantiate_sort_test_inner!($sort_impl, random_d4);
        $crate::instantiate_sort_test_inner!($sort_impl, random_binary);
        $crate::instantiate_sort_test_inner!($sort_impl, random_zipf);
        $crate::instantiate_sort_test_inner!($sort_impl, ascending);
        $crate::instantiate_sort_test_inner!($sort_impl, descending);
        $crate::instantiate_sort_test_inner!($sort_impl, all_equal);
        $crate::instantiate_sort_test_inner!($sort_impl, saw_mixed);
        $crate::instantiate_sort_test_inner!($sort_impl, pipe_organ);
        $crate::instantiate_sort_test_inner!($sort_impl, sentinel_heavy);
        $crate::instantiate_sort_test_inner!($sort_impl, special_values);
        $crate::instantiate_sort_test_inner!($sort_impl, idempotent);
        $crate::instantiate_sort_test_inner!($sort_impl, random_200);
        $crate::instantiate_sort_test_inner!($sort_impl, random_lengths);
        $crate::instantiate_sort_test_inner!($sort_impl, misaligned_subslices);
    };
}
