// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::cover::Cover;
use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::debug;

impl Cover {
    /// Given the prime implicants in `self`, returns every irredundant selection of them that
    /// covers all of `on_set`, using Petrick's method.
    ///
    /// Selections mentioning a strict superset of the variables of another selection are dropped.
    pub fn minimal_covers(&self, on_set: &Cover) -> Vec<Cover> {
        let primes: Vec<_> = self.elements().iter().collect();

        // For every minterm, the primes covering it.
        let covering: Vec<Vec<usize>> = on_set
            .elements()
            .iter()
            .map(|minterm| {
                primes
                    .iter()
                    .enumerate()
                    .filter_map(|(ix, prime)| prime.contains(minterm).then(|| ix))
                    .collect()
            })
            .collect();

        if covering.iter().any(Vec::is_empty) {
            // Every on-set minterm is reachable from its own reductions, so this only happens
            // when the caller passes primes for a different on-set.
            debug!("on-set minterm not covered by any prime implicant");
            return Vec::new();
        }

        let essential: BTreeSet<usize> = covering
            .iter()
            .filter(|primes| primes.len() == 1)
            .map(|primes| primes[0])
            .collect();

        // Product of sums over the minterms essential primes don't reach, expanded one sum at a
        // time.
        let mut products: Vec<BTreeSet<usize>> = vec![BTreeSet::new()];
        for sum in covering
            .iter()
            .filter(|primes| !primes.iter().any(|ix| essential.contains(ix)))
        {
            let expanded: BTreeSet<BTreeSet<usize>> = products
                .iter()
                .flat_map(|product| {
                    sum.iter().map(move |&ix| {
                        let mut product = product.clone();
                        product.insert(ix);
                        product
                    })
                })
                .collect();
            products = absorb(expanded);
        }

        debug!(
            primes = primes.len(),
            essential = essential.len(),
            solutions = products.len(),
            "expanded Petrick product"
        );

        let covers: Vec<Cover> = products
            .into_iter()
            .map(|product| {
                Cover::new(
                    essential
                        .iter()
                        .chain(&product)
                        .map(|&ix| primes[ix].clone()),
                )
            })
            .collect();

        covers
            .iter()
            .filter(|cover| {
                let inputs = cover.mentioned_inputs();
                !covers.iter().any(|other| {
                    let other_inputs = other.mentioned_inputs();
                    other_inputs.len() < inputs.len() && other_inputs.is_subset(inputs)
                })
            })
            .cloned()
            .collect()
    }
}

/// Removes every product that is a strict superset of another product.
fn absorb(products: BTreeSet<BTreeSet<usize>>) -> Vec<BTreeSet<usize>> {
    let products: Vec<_> = products.into_iter().collect();
    products
        .par_iter()
        .filter(|product| {
            !products
                .iter()
                .any(|other| other.len() < product.len() && other.is_subset(product))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_essential_only() {
        // f = ~A*~B + B*C: both ~A*~B and B*C are essential, ~A*C is redundant.
        let on_set =
            Cover::from_numeric([&[0, 0, 0][..], &[0, 0, 1], &[0, 1, 1], &[1, 1, 1]]).unwrap();
        let off_set =
            Cover::from_numeric([&[0, 1, 0][..], &[1, 0, 0], &[1, 0, 1], &[1, 1, 0]]).unwrap();
        let primes = on_set.prime_implicants(&off_set);
        let covers = primes.minimal_covers(&on_set);
        let expected = Cover::from_numeric([&[0, 0, 2][..], &[2, 1, 1]]).unwrap();
        assert_eq!(covers, vec![expected]);
    }

    #[test]
    fn test_cyclic_cover() {
        // With only 11 -> true and 00 -> false, A and B are alternative covers.
        let on_set = Cover::from_numeric([&[1, 1][..]]).unwrap();
        let off_set = Cover::from_numeric([&[0, 0][..]]).unwrap();
        let primes = on_set.prime_implicants(&off_set);
        let covers = primes.minimal_covers(&on_set);
        assert_eq!(
            covers,
            vec![
                Cover::from_numeric([&[2, 1][..]]).unwrap(),
                Cover::from_numeric([&[1, 2][..]]).unwrap(),
            ]
        );
    }

    #[test]
    fn test_absorb() {
        let products: BTreeSet<BTreeSet<usize>> = [vec![0, 1], vec![0], vec![1, 2], vec![0, 2]]
            .into_iter()
            .map(|p| p.into_iter().collect())
            .collect();
        let absorbed = absorb(products);
        let expected: Vec<BTreeSet<usize>> =
            vec![[0].into_iter().collect(), [1, 2].into_iter().collect()];
        assert_eq!(absorbed, expected);
    }
}
