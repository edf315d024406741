//! Candidate selection for the sampled similarity signals

use crate::config::SamplingMode;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use uuid::Uuid;

pub struct Sampler {
    mode: SamplingMode,
    rng: StdRng,
}

impl Sampler {
    /// `seed` only matters in random mode; without one the generator is seeded from entropy.
    pub fn new(mode: SamplingMode, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { mode, rng }
    }

    pub fn deterministic() -> Self {
        Self::new(SamplingMode::Deterministic, Some(0))
    }

    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    /// Choose up to `k` distinct candidates.
    ///
    /// Random mode samples uniformly without replacement; deterministic mode
    /// takes the first `k` by id.
    pub fn pick(&mut self, mut candidates: Vec<Uuid>, k: usize) -> Vec<Uuid> {
        match self.mode {
            SamplingMode::Deterministic => {
                candidates.sort_unstable();
                candidates.truncate(k);
                candidates
            }
            SamplingMode::Random => {
                if candidates.len() <= k {
                    return candidates;
                }
                candidates
                    .choose_multiple(&mut self.rng, k)
                    .copied()
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_deterministic_takes_lowest_ids() {
        let candidates = ids(8);
        let mut expected = candidates.clone();
        expected.sort();
        expected.truncate(3);

        let mut sampler = Sampler::deterministic();
        assert_eq!(sampler.pick(candidates, 3), expected);
    }

    #[test]
    fn test_random_without_replacement() {
        let candidates = ids(10);
        let mut sampler = Sampler::new(SamplingMode::Random, None);
        let picked = sampler.pick(candidates.clone(), 5);
        assert_eq!(picked.len(), 5);
        assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 5);
        assert!(picked.iter().all(|id| candidates.contains(id)));
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let candidates = ids(20);
        let a = Sampler::new(SamplingMode::Random, Some(42)).pick(candidates.clone(), 5);
        let b = Sampler::new(SamplingMode::Random, Some(42)).pick(candidates, 5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fewer_candidates_than_k() {
        let candidates = ids(2);
        let mut sampler = Sampler::new(SamplingMode::Random, Some(1));
        assert_eq!(sampler.pick(candidates.clone(), 5).len(), 2);
        assert!(sampler.pick(Vec::new(), 3).is_empty());
    }
}
