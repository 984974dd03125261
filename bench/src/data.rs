//! Seeded input generation, so every run measures the same data.

use rand::{Rng, SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;

pub const SEED: u64 = 12345;

pub fn rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(SEED)
}

/// `n` distinct keys in random order.
pub fn distinct_keys(n: usize) -> Vec<u64> {
    let mut rng = rng();
    let mut keys: Vec<u64> = (0..n as u64).map(|k| k * 7 + 3).collect();
    keys.shuffle(&mut rng);
    keys
}

/// `n` lookups drawn from `keys`, roughly a quarter of them misses.
pub fn lookups(keys: &[u64], n: usize) -> Vec<u64> {
    let mut rng = rng();
    (0..n)
        .map(|_| {
            if rng.gen_ratio(1, 4) {
                rng.r#gen::<u64>() | 1 << 63
            } else {
                keys[rng.gen_range(0..keys.len())]
            }
        })
        .collect()
}

/// `n` global names of the form `var_<i>`.
pub fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("var_{i}")).collect()
}
