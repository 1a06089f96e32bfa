//! Generic test functions, instantiated per element type by
//! [`instantiate_sort_tests!`](crate::instantiate_sort_tests).

use std::cmp::Ordering;

use rand::prelude::*;

use crate::patterns;
use crate::{random_init_seed, Sort, TestElem};

#[cfg(not(feature = "large_test_sizes"))]
const TEST_SIZES: [usize; 19] = [
    0, 1, 2, 31, 32, 33, 63, 64, 65, 95, 96, 97, 127, 128, 129, 255, 256, 4096, 100_000,
];

#[cfg(feature = "large_test_sizes")]
const TEST_SIZES: [usize; 35] = [
    0, 1, 2, 3, 7, 15, 16, 17, 31, 32, 33, 47, 48, 49, 63, 64, 65, 95, 96, 97, 127, 128, 129, 200,
    255, 256, 257, 1000, 4096, 6143, 6144, 20_000, 100_000, 250_000, 1_000_000,
];

fn map<T: TestElem>(vals: &[i32]) -> Vec<T> {
    vals.iter().map(|&v| T::from_i32(v)).collect()
}

fn same<T: TestElem>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.total_cmp(y) == Ordering::Equal)
}

fn sort_comp<T: TestElem, S: Sort<T>>(v: &mut [T]) {
    let seed = random_init_seed();
    let is_small_test = v.len() <= 100;
    let original = v.to_vec();

    let mut expected = v.to_vec();
    expected.sort_by(T::total_cmp);

    S::sort(v);

    if !same(v, &expected) {
        if is_small_test {
            eprintln!("Original: {original:?}");
            eprintln!("Expected: {expected:?}");
            eprintln!("Got:      {v:?}");
        } else {
            let first_diff = v
                .iter()
                .zip(&expected)
                .position(|(x, y)| x.total_cmp(y) != Ordering::Equal);
            eprintln!("First difference at index {first_diff:?}");
        }
        panic!(
            "{} failed on {} elements, seed {seed}",
            <S as Sort<T>>::name(),
            v.len()
        );
    }
}

fn test_impl<T: TestElem, S: Sort<T>>(pattern_fn: impl Fn(usize) -> Vec<i32>) {
    for test_size in TEST_SIZES {
        let mut test_data = map::<T>(&pattern_fn(test_size));
        sort_comp::<T, S>(&mut test_data);
    }
}

pub fn basic<T: TestElem, S: Sort<T>>() {
    sort_comp::<T, S>(&mut []);
    sort_comp::<T, S>(&mut map::<T>(&[77]));
    sort_comp::<T, S>(&mut map::<T>(&[2, 3]));
    sort_comp::<T, S>(&mut map::<T>(&[3, 2]));
    sort_comp::<T, S>(&mut map::<T>(&[2, 3, 6]));
    sort_comp::<T, S>(&mut map::<T>(&[2, 3, 99, 6]));
    sort_comp::<T, S>(&mut map::<T>(&[2, 7709, 400, 90932]));
    sort_comp::<T, S>(&mut map::<T>(&[15, -1, 3, -1, -3, -1, 7]));
}

pub fn scenario<T: TestElem, S: Sort<T>>() {
    let mut v = map::<T>(&[5, 3, 3, 1, 9, 2, 8, 7, 6, 4]);
    S::sort(&mut v);
    assert!(same(&v, &map::<T>(&[1, 2, 3, 3, 4, 5, 6, 7, 8, 9])));
}

pub fn reverse_64<T: TestElem, S: Sort<T>>() {
    let mut v = map::<T>(&patterns::descending(64));
    S::sort(&mut v);
    assert!(same(&v, &map::<T>(&patterns::ascending(64))));
}

pub fn random<T: TestElem, S: Sort<T>>() {
    test_impl::<T, S>(patterns::random);
}

pub fn random_d4<T: TestElem, S: Sort<T>>() {
    test_impl::<T, S>(|len| patterns::random_uniform(len, 0..4));
}

pub fn random_binary<T: TestElem, S: Sort<T>>() {
    test_impl::<T, S>(|len| patterns::random_uniform(len, 0..2));
}

pub fn random_zipf<T: TestElem, S: Sort<T>>() {
    test_impl::<T, S>(|len| patterns::random_zipf(len, 1.0));
}

pub fn ascending<T: TestElem, S: Sort<T>>() {
    test_impl::<T, S>(patterns::ascending);
}

pub fn descending<T: TestElem, S: Sort<T>>() {
    test_impl::<T, S>(patterns::descending);
}

pub fn all_equal<T: TestElem, S: Sort<T>>() {
    test_impl::<T, S>(patterns::all_equal);
}

pub fn saw_mixed<T: TestElem, S: Sort<T>>() {
    test_impl::<T, S>(|len| patterns::saw_mixed(len, ((len as f64).log2().round()) as usize));
}

pub fn pipe_organ<T: TestElem, S: Sort<T>>() {
    test_impl::<T, S>(patterns::pipe_organ);
}

pub fn sentinel_heavy<T: TestElem, S: Sort<T>>() {
    for test_size in TEST_SIZES {
        for stride in [1, 3] {
            let mut v: Vec<T> = patterns::with_greatest(test_size, stride)
                .into_iter()
                .map(|val| val.map_or_else(T::greatest, T::from_i32))
                .collect();
            sort_comp::<T, S>(&mut v);
        }
    }
}

pub fn special_values<T: TestElem, S: Sort<T>>() {
    let specials = T::specials();
    let mut rng = StdRng::seed_from_u64(random_init_seed());
    for test_size in TEST_SIZES {
        let mut v: Vec<T> = (0..test_size)
            .map(|_| {
                if rng.gen_ratio(1, 4) {
                    specials[rng.gen_range(0..specials.len())]
                } else {
                    T::from_i32(rng.gen_range(-1_000..1_000))
                }
            })
            .collect();
        sort_comp::<T, S>(&mut v);
    }
}

pub fn idempotent<T: TestElem, S: Sort<T>>() {
    for test_size in TEST_SIZES {
        let mut v = map::<T>(&patterns::random(test_size));
        S::sort(&mut v);
        let once = v.clone();
        S::sort(&mut v);
        assert!(same(&v, &once), "second sort of {test_size} elements changed the order");
    }
}

pub fn random_200<T: TestElem, S: Sort<T>>() {
    let input = patterns::random(200);

    let mut v = map::<T>(&input);
    S::sort(&mut v);

    let mut expected = input;
    expected.sort_unstable();
    let expected = map::<T>(&expected);
    for (i, (got, want)) in v.iter().zip(&expected).enumerate() {
        assert!(
            got.total_cmp(want) == Ordering::Equal,
            "{} differs at index {i}: {got:?} != {want:?}",
            <S as Sort<T>>::name()
        );
    }
    assert_eq!(v.len(), 200);
}

pub fn random_lengths<T: TestElem, S: Sort<T>>() {
    let mut rng = StdRng::seed_from_u64(random_init_seed());
    for _ in 0..200 {
        let len = rng.gen_range(0..600);
        let mut v = map::<T>(&patterns::random_uniform(len, -300..300));
        v.shuffle(&mut rng);
        sort_comp::<T, S>(&mut v);
    }
}

pub fn misaligned_subslices<T: TestElem, S: Sort<T>>() {
    const GUARD: usize = 40;

    for len in [129, 200, 1000, 5000] {
        for offset in 0..32 {
            let mut buf = map::<T>(&patterns::random(offset + len + GUARD));
            let before = buf.clone();

            sort_comp::<T, S>(&mut buf[offset..offset + len]);

            assert!(
                same(&buf[..offset], &before[..offset]),
                "elements before a {len} element slice at offset {offset} were touched"
            );
            assert!(
                same(&buf[offset + len..], &before[offset + len..]),
                "elements after a {len} element slice at offset {offset} were touched"
            );
        }
    }
}
