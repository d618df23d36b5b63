// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::cover::Cover;
use std::collections::BTreeSet;
use tracing::trace;

impl Cover {
    /// Given the on-set minterms in `self` and the off-set minterms in `off_set`, generates the
    /// prime implicants of the on-set.
    ///
    /// Terms are reduced one literal at a time. A reduction survives only if it doesn't reach any
    /// off-set minterm; a term none of whose reductions survive is prime.
    pub fn prime_implicants(&self, off_set: &Cover) -> Cover {
        let mut primes = BTreeSet::new();
        let mut current = self.elements().clone();

        while !current.is_empty() {
            let mut next = BTreeSet::new();
            for term in &current {
                let mut is_prime = true;
                for reduced in term.reductions() {
                    // Dropping the last literal leaves the universe, which always reaches the
                    // off-set.
                    if reduced.literal_count() == 0 {
                        continue;
                    }
                    if !off_set.has_point_in(&reduced) {
                        is_prime = false;
                        next.insert(reduced);
                    }
                }
                if is_prime {
                    primes.insert(term.clone());
                }
            }
            trace!(
                primes = primes.len(),
                next = next.len(),
                "reduced one literal"
            );
            current = next;
        }

        Cover::new(primes).single_cube_containment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conjunction() {
        // C = A*B over variables (A, B).
        let on_set = Cover::from_numeric([&[1, 1][..]]).unwrap();
        let off_set = Cover::from_numeric([&[1, 0][..], &[0, 1], &[0, 0]]).unwrap();
        let primes = on_set.prime_implicants(&off_set);
        assert_eq!(primes, on_set);
    }

    #[test]
    fn test_basic() {
        // f = ~A*~B + B*C over (A, B, C), fully specified.
        let on_set =
            Cover::from_numeric([&[0, 0, 0][..], &[0, 0, 1], &[0, 1, 1], &[1, 1, 1]]).unwrap();
        let off_set =
            Cover::from_numeric([&[0, 1, 0][..], &[1, 0, 0], &[1, 0, 1], &[1, 1, 0]]).unwrap();
        let primes = on_set.prime_implicants(&off_set);
        let expected = Cover::from_numeric([&[0, 0, 2][..], &[2, 1, 1], &[0, 2, 1]]).unwrap();
        assert_eq!(primes, expected);
    }

    #[test]
    fn test_partial_function() {
        // Unobserved minterms act as don't-cares: with only 11 -> true and 00 -> false, both A and
        // B are prime.
        let on_set = Cover::from_numeric([&[1, 1][..]]).unwrap();
        let off_set = Cover::from_numeric([&[0, 0][..]]).unwrap();
        let expected = Cover::from_numeric([&[1, 2][..], &[2, 1]]).unwrap();
        assert_eq!(on_set.prime_implicants(&off_set), expected);
    }
}
