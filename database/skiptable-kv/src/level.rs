//! Random level source for the skip list.
//!
//! Levels follow a geometric distribution: `P(level = k)` halves with every
//! step up, and whatever mass lies above `max_level` is folded into
//! `max_level` itself instead of being resampled.

use rand::{rngs::StdRng, Rng, SeedableRng};

#[derive(Debug)]
pub struct LevelGenerator {
    max_level: usize,
    rng: StdRng,
}

impl LevelGenerator {
    /// Seeds from OS entropy.
    pub fn new(max_level: usize) -> LevelGenerator {
        LevelGenerator {
            max_level,
            rng: StdRng::from_entropy(),
        }
    }

    /// Same seed, same sequence of levels.
    pub fn with_seed(max_level: usize, seed: u64) -> LevelGenerator {
        LevelGenerator {
            max_level,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Returns a level in `1..=max_level`.
    pub fn next_level(&mut self) -> usize {
        let mut level = 1;
        while level < self.max_level && self.rng.gen_bool(0.5) {
            level += 1;
        }
        level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_stay_in_range() {
        let mut generator = LevelGenerator::with_seed(6, 7);
        for _ in 0..10_000 {
            let level = generator.next_level();
            assert!((1..=6).contains(&level));
        }
    }

    #[test]
    fn single_level_ceiling() {
        let mut generator = LevelGenerator::new(1);
        for _ in 0..100 {
            assert_eq!(generator.next_level(), 1);
        }
    }

    #[test]
    fn seeded_generators_agree() {
        let mut a = LevelGenerator::with_seed(12, 42);
        let mut b = LevelGenerator::with_seed(12, 42);
        let xs: Vec<usize> = (0..256).map(|_| a.next_level()).collect();
        let ys: Vec<usize> = (0..256).map(|_| b.next_level()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn roughly_geometric() {
        let mut generator = LevelGenerator::with_seed(16, 1);
        let draws = 100_000;
        let ones = (0..draws).filter(|_| generator.next_level() == 1).count();
        // expected half of all draws
        assert!(ones > draws * 45 / 100 && ones < draws * 55 / 100, "{}", ones);
    }
}
