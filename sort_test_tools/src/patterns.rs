//! Input generators. All patterns produce `i32` values; tests map them through
//! [`TestElem::from_i32`](crate::TestElem::from_i32).

use std::ops::Range;

use rand::prelude::*;
use zipf::ZipfDistribution;

use crate::random_init_seed;

fn rng() -> StdRng {
    StdRng::seed_from_u64(random_init_seed())
}

pub fn random(len: usize) -> Vec<i32> {
    //     .
    // : . : :
    // :.:::.::

    let mut rng = rng();
    (0..len).map(|_| rng.gen::<i32>()).collect()
}

pub fn random_uniform(len: usize, range: Range<i32>) -> Vec<i32> {
    let mut rng = rng();
    (0..len).map(|_| rng.gen_range(range.clone())).collect()
}

pub fn random_zipf(len: usize, exponent: f64) -> Vec<i32> {
    // https://en.wikipedia.org/wiki/Zipf's_law

    let mut rng = rng();
    let dist = ZipfDistribution::new(len.max(1), exponent).unwrap();
    (0..len).map(|_| dist.sample(&mut rng) as i32).collect()
}

pub fn all_equal(len: usize) -> Vec<i32> {
    // ......
    // ::::::

    vec![66; len]
}

pub fn ascending(len: usize) -> Vec<i32> {
    //     .:
    //   .:::
    // .:::::

    (0..len as i32).collect()
}

pub fn descending(len: usize) -> Vec<i32> {
    // :.
    // :::.
    // :::::.

    (0..len as i32).rev().collect()
}

pub fn saw_mixed(len: usize, saw_count: usize) -> Vec<i32> {
    // :.  :.    .::.    .:
    // :::.:::..::::::..:::

    if len == 0 {
        return Vec::new();
    }

    let mut vals = random(len);
    let chunk_size = len.div_ceil(saw_count.max(1));
    for (i, chunk) in vals.chunks_mut(chunk_size).enumerate() {
        if i % 2 == 0 {
            chunk.sort_unstable();
        } else {
            chunk.sort_unstable_by(|a, b| b.cmp(a));
        }
    }
    vals
}

pub fn pipe_organ(len: usize) -> Vec<i32> {
    //   .:.
    // .:::::.

    let mut vals = random(len);
    let first_half = &mut vals[0..(len / 2)];
    first_half.sort_unstable();

    let second_half = &mut vals[(len / 2)..len];
    second_half.sort_unstable_by(|a, b| b.cmp(a));
    vals
}

/// Random values where every `stride`-th element is the greatest value of the type.
pub fn with_greatest(len: usize, stride: usize) -> Vec<Option<i32>> {
    random(len)
        .into_iter()
        .enumerate()
        .map(|(i, val)| if i % stride == 0 { None } else { Some(val) })
        .collect()
}
