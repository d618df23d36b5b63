// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use proptest::{
    strategy::{Strategy, ValueTree},
    test_runner::{Config, RngAlgorithm, TestRng, TestRunner},
};
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

/// Generates deterministic values from proptest strategies.
pub struct ValueGenerator {
    runner: TestRunner,
}

impl ValueGenerator {
    /// Creates a generator whose values depend only on `seed`.
    pub fn from_seed(seed: impl Hash) -> Self {
        let mut hasher = XxHash64::default();
        seed.hash(&mut hasher);
        let hash = hasher.finish().to_le_bytes();

        let mut seed_bytes = [0u8; 32];
        for chunk in seed_bytes.chunks_mut(hash.len()) {
            chunk.copy_from_slice(&hash);
        }
        let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &seed_bytes);
        Self {
            runner: TestRunner::new_with_rng(Config::default(), rng),
        }
    }

    /// Returns a generator forked off this one's random state.
    pub fn partial_clone(&mut self) -> Self {
        Self {
            runner: TestRunner::new_with_rng(Config::default(), self.runner.new_rng()),
        }
    }

    pub fn generate<S: Strategy>(&mut self, strategy: S) -> S::Value {
        strategy
            .new_tree(&mut self.runner)
            .expect("fixture strategies never reject values")
            .current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::vec;

    #[test]
    fn test_partial_clone_is_deterministic() {
        let strategy = || vec(any_u64(), 8);
        let mut first = ValueGenerator::from_seed("fork");
        let mut second = ValueGenerator::from_seed("fork");
        let first_fork = first.partial_clone().generate(strategy());
        let second_fork = second.partial_clone().generate(strategy());
        assert_eq!(first_fork, second_fork);

        // The fork advances the parent, so the parent doesn't replay the fork's values.
        assert_eq!(first.generate(strategy()), second.generate(strategy()));
        let mut third = ValueGenerator::from_seed("fork");
        assert_ne!(third.generate(strategy()), first_fork);
    }

    fn any_u64() -> impl Strategy<Value = u64> {
        proptest::num::u64::ANY
    }
}
