// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Factors partitioned into constitutive levels and, within a level, into causal orders.

use crate::{errors::InvalidHierarchy, factor::Factor, formula::Dnf};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Where a factor sits in a [`FactorHierarchy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Placement {
    pub level: usize,
    pub order: usize,
}

/// Levels, each consisting of causal orders, each consisting of factors.
///
/// Level 0 is the lowest constitutive level. Every factor appears exactly once.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Vec<Factor>>>", into = "Vec<Vec<Vec<Factor>>>")]
pub struct FactorHierarchy {
    levels: Vec<Vec<Vec<Factor>>>,
    index: OnceCell<HashMap<Factor, Placement>>,
}

impl FactorHierarchy {
    pub fn new(levels: Vec<Vec<Vec<Factor>>>) -> Result<Self, InvalidHierarchy> {
        let mut seen = BTreeSet::new();
        for factor in levels.iter().flatten().flatten() {
            if !seen.insert(factor) {
                return Err(InvalidHierarchy::DuplicateFactor {
                    factor: factor.clone(),
                });
            }
        }
        Ok(Self {
            levels,
            index: OnceCell::new(),
        })
    }

    /// A hierarchy with a single level and a single causal order.
    pub fn flat(factors: Vec<Factor>) -> Result<Self, InvalidHierarchy> {
        Self::new(vec![vec![factors]])
    }

    /// A hierarchy where every level consists of a single causal order.
    pub fn from_levels(levels: Vec<Vec<Factor>>) -> Result<Self, InvalidHierarchy> {
        Self::new(levels.into_iter().map(|level| vec![level]).collect())
    }

    #[inline]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn levels(&self) -> &[Vec<Vec<Factor>>] {
        &self.levels
    }

    /// Returns the causal orders of a level, or an empty slice if the level doesn't exist.
    pub fn orders(&self, level: usize) -> &[Vec<Factor>] {
        self.levels.get(level).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns all factors of a level, in order.
    pub fn level_factors(&self, level: usize) -> Vec<Factor> {
        self.orders(level).iter().flatten().cloned().collect()
    }

    pub fn factors(&self) -> impl Iterator<Item = &Factor> + '_ {
        self.levels.iter().flatten().flatten()
    }

    #[inline]
    pub fn factor_count(&self) -> usize {
        self.get_or_init_index().len()
    }

    #[inline]
    pub fn contains(&self, factor: &Factor) -> bool {
        self.get_or_init_index().contains_key(factor)
    }

    #[inline]
    pub fn placement(&self, factor: &Factor) -> Option<Placement> {
        self.get_or_init_index().get(factor).copied()
    }

    #[inline]
    pub fn level_of(&self, factor: &Factor) -> Option<usize> {
        self.placement(factor).map(|p| p.level)
    }

    #[inline]
    pub fn order_of(&self, factor: &Factor) -> Option<usize> {
        self.placement(factor).map(|p| p.order)
    }

    /// Returns the level shared by every factor of the formula.
    ///
    /// Returns `None` if the formula is empty, mentions an unknown factor or spans several levels.
    pub fn formula_level(&self, formula: &Dnf) -> Option<usize> {
        let mut levels = formula.factors().into_iter().map(|f| self.level_of(&f));
        let first = levels.next()??;
        levels
            .all(|level| level == Some(first))
            .then(|| first)
    }

    /// Pairs `(earlier, later)` of factors on the same level where `earlier` was listed in a lower
    /// causal order than `later`.
    pub fn order_constraints(&self, level: usize) -> Vec<(Factor, Factor)> {
        let orders = self.orders(level);
        let mut constraints = Vec::new();
        for (ix, earlier_order) in orders.iter().enumerate() {
            for later_order in &orders[ix + 1..] {
                for earlier in earlier_order {
                    for later in later_order {
                        constraints.push((earlier.clone(), later.clone()));
                    }
                }
            }
        }
        constraints
    }

    /// Returns a new hierarchy with the given factors removed. Orders that become empty are
    /// dropped; levels are kept so that level numbers stay stable.
    pub fn without(&self, removed: &BTreeSet<Factor>) -> Self {
        let levels = self
            .levels
            .iter()
            .map(|orders| {
                orders
                    .iter()
                    .map(|order| {
                        order
                            .iter()
                            .filter(|f| !removed.contains(*f))
                            .cloned()
                            .collect::<Vec<_>>()
                    })
                    .filter(|order| !order.is_empty())
                    .collect()
            })
            .collect();
        Self {
            levels,
            index: OnceCell::new(),
        }
    }

    pub fn to_factor_set(&self) -> FactorSet {
        FactorSet::ByLevelAndOrder(self.levels.clone())
    }

    fn get_or_init_index(&self) -> &HashMap<Factor, Placement> {
        self.index.get_or_init(|| {
            let mut index = HashMap::new();
            for (level, orders) in self.levels.iter().enumerate() {
                for (order, factors) in orders.iter().enumerate() {
                    for factor in factors {
                        index.insert(factor.clone(), Placement { level, order });
                    }
                }
            }
            index
        })
    }
}

impl PartialEq for FactorHierarchy {
    fn eq(&self, other: &Self) -> bool {
        self.levels == other.levels
    }
}

impl Eq for FactorHierarchy {}

impl TryFrom<Vec<Vec<Vec<Factor>>>> for FactorHierarchy {
    type Error = InvalidHierarchy;

    fn try_from(levels: Vec<Vec<Vec<Factor>>>) -> Result<Self, Self::Error> {
        Self::new(levels)
    }
}

impl From<FactorHierarchy> for Vec<Vec<Vec<Factor>>> {
    fn from(hierarchy: FactorHierarchy) -> Self {
        hierarchy.levels
    }
}

/// A collection of factors, either flat, grouped by level, or grouped by level and causal order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FactorSet {
    Flat(Vec<Factor>),
    ByLevel(Vec<Vec<Factor>>),
    ByLevelAndOrder(Vec<Vec<Vec<Factor>>>),
}

impl FactorSet {
    /// Iterates over every factor regardless of grouping.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Factor> + '_> {
        match self {
            Self::Flat(factors) => Box::new(factors.iter()),
            Self::ByLevel(levels) => Box::new(levels.iter().flatten()),
            Self::ByLevelAndOrder(levels) => Box::new(levels.iter().flatten().flatten()),
        }
    }

    pub fn contains(&self, factor: &Factor) -> bool {
        self.iter().any(|f| f == factor)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn to_flat(&self) -> Vec<Factor> {
        self.iter().cloned().collect()
    }
}

impl From<Vec<Factor>> for FactorSet {
    fn from(factors: Vec<Factor>) -> Self {
        Self::Flat(factors)
    }
}

impl<'a> From<&'a [Factor]> for FactorSet {
    fn from(factors: &'a [Factor]) -> Self {
        Self::Flat(factors.to_vec())
    }
}

impl From<BTreeSet<Factor>> for FactorSet {
    fn from(factors: BTreeSet<Factor>) -> Self {
        Self::Flat(factors.into_iter().collect())
    }
}

impl From<Vec<Vec<Factor>>> for FactorSet {
    fn from(levels: Vec<Vec<Factor>>) -> Self {
        Self::ByLevel(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factors(names: &[&str]) -> Vec<Factor> {
        names.iter().map(|n| Factor::new(n).unwrap()).collect()
    }

    #[test]
    fn test_placement() {
        let hierarchy = FactorHierarchy::new(vec![
            vec![factors(&["A", "B"]), factors(&["C"])],
            vec![factors(&["D"])],
        ])
        .unwrap();
        let c = Factor::new("C").unwrap();
        assert_eq!(
            hierarchy.placement(&c),
            Some(Placement { level: 0, order: 1 })
        );
        assert_eq!(hierarchy.level_of(&Factor::new("D").unwrap()), Some(1));
        assert_eq!(hierarchy.level_of(&Factor::new("E").unwrap()), None);
        assert_eq!(hierarchy.factor_count(), 4);

        let constraints = hierarchy.order_constraints(0);
        assert_eq!(constraints.len(), 2, "A and B both precede C");
        assert!(hierarchy.order_constraints(1).is_empty());
    }

    #[test]
    fn test_duplicate_factor() {
        let result = FactorHierarchy::from_levels(vec![factors(&["A", "B"]), factors(&["A"])]);
        assert!(matches!(
            result,
            Err(InvalidHierarchy::DuplicateFactor { factor }) if factor.name() == "A"
        ));
    }

    #[test]
    fn test_formula_level() {
        let hierarchy =
            FactorHierarchy::from_levels(vec![factors(&["A", "B"]), factors(&["C", "D"])])
                .unwrap();
        let same: Dnf = "A*~B".parse().unwrap();
        let mixed: Dnf = "A + C".parse().unwrap();
        assert_eq!(hierarchy.formula_level(&same), Some(0));
        assert_eq!(hierarchy.formula_level(&mixed), None);
    }

    #[test]
    fn test_factor_set_shapes() {
        let flat = FactorSet::from(factors(&["A", "B"]));
        let nested = FactorSet::ByLevelAndOrder(vec![vec![factors(&["A"]), factors(&["B"])]]);
        assert_eq!(flat.to_flat(), nested.to_flat());
        assert!(nested.contains(&Factor::new("B").unwrap()));
        assert_eq!(nested.len(), 2);
    }
}
