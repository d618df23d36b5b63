// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Causal ordering and structural redundancy reduction.

use crate::{
    cluster::Clusters,
    errors::ModelError,
    factor::Factor,
    formula::Equivalence,
    hierarchy::FactorSet,
};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, trace};

/// Factors arranged into causal orders by a set of relations.
///
/// Order 0 holds the factors no relation targets. Each following order holds the factors whose
/// causes all sit in earlier orders. Factors on a cycle can't be placed and end up in `residual`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CausalOrdering {
    orders: Vec<Vec<Factor>>,
    residual: Vec<Factor>,
}

impl CausalOrdering {
    pub fn new(relations: &[Equivalence], factors: &FactorSet) -> Self {
        let mut listed: Vec<Factor> = Vec::new();
        for factor in factors.iter() {
            if !listed.contains(factor) {
                listed.push(factor.clone());
            }
        }
        let in_set: BTreeSet<&Factor> = listed.iter().collect();

        // Causes of every targeted factor, restricted to the factor set.
        let mut causes: BTreeMap<&Factor, BTreeSet<Factor>> = BTreeMap::new();
        for relation in relations {
            if let Some(&consequent) = in_set.get(relation.consequent()) {
                causes.entry(consequent).or_default().extend(
                    relation
                        .causes()
                        .into_iter()
                        .filter(|f| in_set.contains(f)),
                );
            }
        }

        let mut assigned: HashMap<Factor, usize> = listed
            .iter()
            .filter(|f| !causes.contains_key(f))
            .map(|f| (f.clone(), 0))
            .collect();

        if !assigned.is_empty() {
            loop {
                let newly: Vec<(Factor, usize)> = listed
                    .iter()
                    .filter(|f| !assigned.contains_key(*f))
                    .filter_map(|f| {
                        let mut max_order = 0;
                        for cause in causes.get(f)? {
                            max_order = max_order.max(*assigned.get(cause)?);
                        }
                        Some((f.clone(), max_order + 1))
                    })
                    .collect();
                if newly.is_empty() {
                    break;
                }
                assigned.extend(newly);
            }
        }

        let order_count = assigned.values().max().map_or(0, |max| max + 1);
        let mut orders = vec![Vec::new(); order_count];
        let mut residual = Vec::new();
        for factor in listed {
            match assigned.get(&factor) {
                Some(&order) => orders[order].push(factor),
                None => residual.push(factor),
            }
        }

        Self { orders, residual }
    }

    /// Returns true if every factor could be placed, i.e. the relations contain no cycle.
    #[inline]
    pub fn is_transitive(&self) -> bool {
        self.residual.is_empty()
    }

    #[inline]
    pub fn orders(&self) -> &[Vec<Factor>] {
        &self.orders
    }

    #[inline]
    pub fn residual(&self) -> &[Factor] {
        &self.residual
    }

    /// The orders followed by the residual factors as one terminal pseudo-order, for display.
    pub fn display_orders(&self) -> Vec<Vec<Factor>> {
        let mut orders = self.orders.clone();
        if !self.residual.is_empty() {
            orders.push(self.residual.clone());
        }
        orders
    }

    pub fn order_of(&self, factor: &Factor) -> Option<usize> {
        self.orders.iter().position(|order| order.contains(factor))
    }
}

/// Returns true if the relations admit a causal ordering of `factors`.
pub fn is_transitive(relations: &[Equivalence], factors: &FactorSet) -> bool {
    CausalOrdering::new(relations, factors).is_transitive()
}

/// Counts the assignments to `variables` that satisfy every relation. Factors outside
/// `variables` are taken to be false.
pub fn count_satisfying(
    relations: &[Equivalence],
    variables: &[Factor],
    limit: usize,
) -> Result<u64, ModelError> {
    if variables.len() > limit {
        return Err(ModelError::TooManyFactors {
            count: variables.len(),
            limit,
        });
    }
    let index: HashMap<&Factor, usize> = variables
        .iter()
        .enumerate()
        .map(|(ix, f)| (f, ix))
        .collect();

    let count = (0..1_u64 << variables.len())
        .into_par_iter()
        .filter(|&assignment| {
            relations.iter().all(|relation| {
                relation.holds(|f| {
                    index
                        .get(f)
                        .map_or(false, |&bit| (assignment >> bit) & 1 == 1)
                })
            })
        })
        .count();
    Ok(count as u64)
}

/// The outcome of [`reduce_structural_redundancy`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reduction {
    /// Every acyclic, logically equivalent relation set reached by removing relations.
    Reduced(Vec<Vec<Equivalence>>),
    /// No acyclic alternative exists; carries the original relations.
    Unresolvable(Vec<Equivalence>),
}

impl Reduction {
    pub fn alternatives(&self) -> &[Vec<Equivalence>] {
        match self {
            Self::Reduced(alternatives) => alternatives,
            Self::Unresolvable(_) => &[],
        }
    }
}

/// Removes relations from a cyclic relation set as long as that keeps the set logically
/// equivalent, until it becomes acyclic.
///
/// A reduced set is equivalent if it connects the same clusters and admits the same number of
/// satisfying assignments. Every acyclic set reached this way is collected.
pub fn reduce_structural_redundancy(
    relations: &[Equivalence],
    factors: &FactorSet,
    limit: usize,
) -> Result<Reduction, ModelError> {
    let mut relations = relations.to_vec();
    relations.sort();
    relations.dedup();

    if is_transitive(&relations, factors) {
        return Ok(Reduction::Reduced(vec![relations]));
    }

    let variables: Vec<Factor> = relations
        .iter()
        .flat_map(Equivalence::factors)
        .filter(|f| factors.contains(f))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut reducer = Reducer {
        factors,
        limit,
        target_clusters: Clusters::new(&relations, factors),
        target_count: count_satisfying(&relations, &variables, limit)?,
        variables,
        tested: HashSet::new(),
        found: Vec::new(),
    };
    reducer.visit(&relations)?;

    debug!(
        relations = relations.len(),
        tested = reducer.tested.len(),
        found = reducer.found.len(),
        "reduced structural redundancy"
    );
    if reducer.found.is_empty() {
        Ok(Reduction::Unresolvable(relations))
    } else {
        Ok(Reduction::Reduced(reducer.found))
    }
}

struct Reducer<'a> {
    factors: &'a FactorSet,
    limit: usize,
    target_clusters: Clusters,
    target_count: u64,
    variables: Vec<Factor>,
    tested: HashSet<Vec<Equivalence>>,
    found: Vec<Vec<Equivalence>>,
}

impl<'a> Reducer<'a> {
    fn visit(&mut self, relations: &[Equivalence]) -> Result<(), ModelError> {
        for ix in 0..relations.len() {
            let reduced: Vec<Equivalence> = relations
                .iter()
                .enumerate()
                .filter(|&(other, _)| other != ix)
                .map(|(_, r)| r.clone())
                .collect();
            if !self.tested.insert(reduced.clone()) {
                continue;
            }
            if Clusters::new(&reduced, self.factors) != self.target_clusters {
                trace!(removed = %relations[ix], "removal disconnects factors");
                continue;
            }
            if count_satisfying(&reduced, &self.variables, self.limit)? != self.target_count {
                trace!(removed = %relations[ix], "removal changes the models");
                continue;
            }
            if is_transitive(&reduced, self.factors) {
                if !self.found.contains(&reduced) {
                    self.found.push(reduced);
                }
            } else {
                self.visit(&reduced)?;
            }
        }
        Ok(())
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

    fn names(factors: &[Factor]) -> Vec<&str> {
        factors.iter().map(Factor::name).collect()
    }

    #[test]
    fn test_chain() {
        let ordering = CausalOrdering::new(
            &relations(&["A*D <-> B", "B <-> C"]),
            &factors(&["A", "B", "C", "D"]),
        );
        assert!(ordering.is_transitive());
        let orders: Vec<_> = ordering.orders().iter().map(|o| names(o)).collect();
        assert_eq!(orders, vec![vec!["A", "D"], vec!["B"], vec!["C"]]);
    }

    #[test]
    fn test_order_uses_all_relations() {
        // C has two relations; its order follows the deeper one.
        let ordering = CausalOrdering::new(
            &relations(&["A <-> B", "B <-> C", "A <-> C"]),
            &factors(&["A", "B", "C"]),
        );
        assert_eq!(ordering.order_of(&Factor::new("C").unwrap()), Some(2));
    }

    #[test]
    fn test_cycle() {
        let ordering = CausalOrdering::new(
            &relations(&["A <-> B", "B <-> C", "C <-> B"]),
            &factors(&["A", "B", "C"]),
        );
        assert!(!ordering.is_transitive());
        assert_eq!(names(ordering.residual()), vec!["B", "C"]);
        assert_eq!(ordering.display_orders().len(), 2);

        // Without any untargeted factor nothing can be placed.
        let ordering =
            CausalOrdering::new(&relations(&["A <-> B", "B <-> A"]), &factors(&["A", "B"]));
        assert!(ordering.orders().is_empty());
        assert_eq!(ordering.residual().len(), 2);
    }

    #[test]
    fn test_empty() {
        assert!(is_transitive(&[], &factors(&[])));
        assert!(is_transitive(&[], &factors(&["A"])));
    }

    #[test]
    fn test_count_satisfying() {
        let variables = factors(&["A", "B", "D"]).to_flat();
        let count = count_satisfying(&relations(&["A*D <-> B"]), &variables, 24).unwrap();
        assert_eq!(count, 4);
        let count =
            count_satisfying(&relations(&["A*D <-> B", "B <-> A"]), &variables, 24).unwrap();
        // A = B = A*D leaves 000, 001 and 111 (A, B, D).
        assert_eq!(count, 3);
        assert!(matches!(
            count_satisfying(&[], &variables, 2),
            Err(ModelError::TooManyFactors { count: 3, limit: 2 })
        ));
    }

    #[test]
    fn test_reduce_two_cycle() {
        let set = factors(&["A", "B"]);
        let reduction =
            reduce_structural_redundancy(&relations(&["A <-> B", "B <-> A"]), &set, 24).unwrap();
        assert_eq!(
            reduction,
            Reduction::Reduced(vec![relations(&["A <-> B"]), relations(&["B <-> A"])])
        );
    }

    #[test]
    fn test_reduce_unresolvable() {
        let set = factors(&["A", "B", "D"]);
        let original = relations(&["B <-> A", "A*D <-> B"]);
        let reduction = reduce_structural_redundancy(&original, &set, 24).unwrap();
        assert_eq!(reduction, Reduction::Unresolvable(original));
        assert!(reduction.alternatives().is_empty());
    }

    #[test]
    fn test_reduce_transitive_input() {
        let set = factors(&["A", "B"]);
        let reduction = reduce_structural_redundancy(&relations(&["A <-> B"]), &set, 24).unwrap();
        assert_eq!(reduction.alternatives().len(), 1);
    }
}
