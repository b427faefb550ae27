//! Deterministic, seedable random source shared by every generator.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const STRING_ALPHABET: &[char] = &[
    'a', 'b', 'c', 'd', 'e', 'f', 'x', 'y', 'z', 'A', 'B', 'Z', '0', '1', '7', '9', ' ', '\'',
    '%', '_', '-', '.', ',', '!', 'é', 'ß',
];

const MAX_RANDOM_STRING_LEN: usize = 20;

/// Bound used by [`Randomly::double`]; keeps fixed-point renderings short and
/// inside the default DECIMAL precision.
const DOUBLE_BOUND: f64 = 100_000.0;

pub struct Randomly {
    rng: ChaCha8Rng,
    seed: u64,
}

impl Randomly {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Any 32-bit signed integer.
    pub fn integer(&mut self) -> i32 {
        self.rng.random()
    }

    /// Integer in `[min, max]`, both inclusive. Swapped bounds are tolerated.
    pub fn integer_in(&mut self, min: i32, max: i32) -> i32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.rng.random_range(lo..=hi)
    }

    pub fn long_in(&mut self, min: i64, max: i64) -> i64 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.rng.random_range(lo..=hi)
    }

    /// Finite double in `(-DOUBLE_BOUND, DOUBLE_BOUND)`.
    pub fn double(&mut self) -> f64 {
        self.rng.random_range(-DOUBLE_BOUND..DOUBLE_BOUND)
    }

    pub fn boolean(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }

    /// Bernoulli draw with probability `p`, clamped to `[0, 1]`. NaN never
    /// fires.
    pub fn chance(&mut self, p: f64) -> bool {
        if p.is_nan() {
            return false;
        }
        self.rng.random_bool(p.clamp(0.0, 1.0))
    }

    /// Short string over a small alphabet that deliberately includes quotes
    /// and LIKE wildcards.
    pub fn string(&mut self) -> String {
        let len = self.rng.random_range(0..=MAX_RANDOM_STRING_LEN);
        (0..len)
            .map(|_| STRING_ALPHABET[self.rng.random_range(0..STRING_ALPHABET.len())])
            .collect()
    }

    /// Uniform pick; `None` for an empty slice.
    pub fn choose_one_of<'a, T>(&mut self, options: &'a [T]) -> Option<&'a T> {
        if options.is_empty() {
            return None;
        }
        let idx = self.rng.random_range(0..options.len());
        options.get(idx)
    }

    pub fn next_seed(&mut self) -> u64 {
        self.rng.random()
    }
}
