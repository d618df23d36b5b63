// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{factor::Factor, formula::Equivalence, hierarchy::FactorSet};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Disjoint groups of factors connected through shared relations.
///
/// Groups are sorted internally and among themselves, so two clusterings of the same factors
/// compare equal exactly when they connect the same factors.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Clusters(Vec<BTreeSet<Factor>>);

impl Clusters {
    /// Groups `factors` so that the factors of every relation end up in the same group. Factors
    /// mentioned by no relation form groups of their own; factors outside `factors` are ignored.
    pub fn new(relations: &[Equivalence], factors: &FactorSet) -> Self {
        let factors: Vec<Factor> = factors.iter().cloned().collect();
        let index: HashMap<&Factor, usize> =
            factors.iter().enumerate().map(|(ix, f)| (f, ix)).collect();
        let mut sets = DisjointSets::new(factors.len());

        for relation in relations {
            let mut members = relation
                .factors()
                .into_iter()
                .filter_map(|f| index.get(&f).copied());
            if let Some(first) = members.next() {
                for other in members {
                    sets.union(first, other);
                }
            }
        }

        let mut groups: BTreeMap<usize, BTreeSet<Factor>> = BTreeMap::new();
        for (ix, factor) in factors.iter().enumerate() {
            groups
                .entry(sets.find(ix))
                .or_default()
                .insert(factor.clone());
        }
        let mut groups: Vec<_> = groups.into_values().collect();
        groups.sort();
        Self(groups)
    }

    #[inline]
    pub fn groups(&self) -> &[BTreeSet<Factor>] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_groups(self) -> Vec<BTreeSet<Factor>> {
        self.0
    }
}

struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, ix: usize) -> usize {
        let mut root = ix;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = ix;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (a, b) = (self.find(a), self.find(b));
        if a != b {
            self.parent[a.max(b)] = a.min(b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relations(specs: &[&str]) -> Vec<Equivalence> {
        specs.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn factors(names: &[&str]) -> FactorSet {
        FactorSet::Flat(names.iter().map(|n| Factor::new(n).unwrap()).collect())
    }

    #[test]
    fn test_transitive_grouping() {
        let clusters = Clusters::new(
            &relations(&["A*B <-> C", "D <-> E", "C <-> F"]),
            &factors(&["A", "B", "C", "D", "E", "F", "G"]),
        );
        let rendered: Vec<Vec<&str>> = clusters
            .groups()
            .iter()
            .map(|g| g.iter().map(Factor::name).collect())
            .collect();
        assert_eq!(
            rendered,
            vec![vec!["A", "B", "C", "F"], vec!["D", "E"], vec!["G"]]
        );
    }

    #[test]
    fn test_equality_is_order_independent() {
        let set = factors(&["A", "B", "C"]);
        let a = Clusters::new(&relations(&["A <-> B"]), &set);
        let b = Clusters::new(&relations(&["B <-> A"]), &set);
        let c = Clusters::new(&relations(&["B <-> C"]), &set);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_empty() {
        assert!(Clusters::new(&[], &factors(&[])).is_empty());
    }
}
