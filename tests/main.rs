use simd_block_sort::{Element, Strategy};
use sort_test_tools::Sort;

mod quick {
    use super::*;

    struct SortImpl {}

    impl<T: Element> Sort<T> for SortImpl {
        fn name() -> String {
            format!("simd_block_sort_{}", Strategy::Quick)
        }

        fn sort(arr: &mut [T]) {
            simd_block_sort::sort(arr);
        }
    }

    sort_test_tools::instantiate_sort_tests!(SortImpl);
}

mod merge {
    use super::*;

    struct SortImpl {}

    impl<T: Element> Sort<T> for SortImpl {
        fn name() -> String {
            format!("simd_block_sort_{}", Strategy::Merge)
        }

        fn sort(arr: &mut [T]) {
            simd_block_sort::try_sort_with(arr, Strategy::Merge).unwrap();
        }
    }

    sort_test_tools::instantiate_sort_tests!(SortImpl);
}

mod raw {
    use super::*;

    struct SortImpl {}

    impl<T: Element> Sort<T> for SortImpl {
        fn name() -> String {
            "simd_block_sort_raw".into()
        }

        fn sort(arr: &mut [T]) {
            // SAFETY: `arr` is exclusively borrowed for the duration of the call.
            unsafe { simd_block_sort::try_sort_raw(arr.as_mut_ptr(), arr.len(), Strategy::Quick) }
                .unwrap();
        }
    }

    sort_test_tools::instantiate_sort_tests!(SortImpl);
}
