// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::ParseFormulaError,
    factor::{Factor, Literal},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A conjunction of literals over distinct factors.
///
/// Literals are kept sorted, so conjunctions compare by value. The empty conjunction is `true`.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Conjunction {
    literals: Vec<Literal>,
}

impl Conjunction {
    /// Creates a conjunction. Repeated literals collapse; a factor appearing with both polarities
    /// is an error.
    pub fn new(literals: impl IntoIterator<Item = Literal>) -> Result<Self, ParseFormulaError> {
        let mut literals: Vec<_> = literals.into_iter().collect();
        literals.sort_unstable();
        literals.dedup();
        for pair in literals.windows(2) {
            if pair[0].factor() == pair[1].factor() {
                return Err(ParseFormulaError::Contradiction {
                    factor: pair[0].factor().clone(),
                });
            }
        }
        Ok(Self { literals })
    }

    #[inline]
    pub fn literal(literal: Literal) -> Self {
        Self {
            literals: vec![literal],
        }
    }

    #[inline]
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn factors(&self) -> impl Iterator<Item = &Factor> + '_ {
        self.literals.iter().map(|l| l.factor())
    }

    pub fn mentions(&self, factor: &Factor) -> bool {
        self.factors().any(|f| f == factor)
    }

    #[inline]
    pub fn contains_literal(&self, literal: &Literal) -> bool {
        self.literals.binary_search(literal).is_ok()
    }

    /// Returns true if every literal of `self` also appears in `other`, i.e. `other` implies
    /// `self`.
    pub fn is_subset(&self, other: &Conjunction) -> bool {
        self.literals.iter().all(|l| other.contains_literal(l))
    }

    pub fn shares_factor(&self, other: &Conjunction) -> bool {
        self.factors().any(|f| other.mentions(f))
    }

    /// Returns the conjunction of both, or `None` if it is contradictory.
    pub fn and(&self, other: &Conjunction) -> Option<Conjunction> {
        Self::new(self.literals.iter().chain(&other.literals).cloned()).ok()
    }

    pub fn evaluate(&self, mut value_of: impl FnMut(&Factor) -> bool) -> bool {
        self.literals
            .iter()
            .all(|l| l.evaluate(value_of(l.factor())))
    }

    /// Replaces the literals at the given positions with the same literal over `to`. Returns
    /// `None` if the result is contradictory.
    fn substitute_at(&self, positions: &[usize], to: &Factor) -> Option<Conjunction> {
        let literals = self.literals.iter().enumerate().map(|(ix, l)| {
            if positions.contains(&ix) {
                Literal::new(to.clone(), l.is_negated())
            } else {
                l.clone()
            }
        });
        Self::new(literals).ok()
    }
}

/// A formula in disjunctive normal form.
///
/// Disjuncts are kept sorted and deduplicated, so two formulas with the same disjuncts in any
/// order are equal. The empty formula is `false`.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dnf {
    disjuncts: Vec<Conjunction>,
}

impl Dnf {
    pub fn new(disjuncts: impl IntoIterator<Item = Conjunction>) -> Self {
        let mut disjuncts: Vec<_> = disjuncts.into_iter().collect();
        disjuncts.sort_unstable();
        disjuncts.dedup();
        Self { disjuncts }
    }

    #[inline]
    pub fn literal(literal: Literal) -> Self {
        Self {
            disjuncts: vec![Conjunction::literal(literal)],
        }
    }

    #[inline]
    pub fn disjuncts(&self) -> &[Conjunction] {
        &self.disjuncts
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.disjuncts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.disjuncts.is_empty()
    }

    /// Returns the single literal this formula consists of, if it is one.
    pub fn as_literal(&self) -> Option<&Literal> {
        match self.disjuncts.as_slice() {
            [conj] if conj.len() == 1 => conj.literals().first(),
            _ => None,
        }
    }

    /// Returns the single disjunct of this formula, if it has exactly one.
    pub fn as_conjunction(&self) -> Option<&Conjunction> {
        match self.disjuncts.as_slice() {
            [conj] => Some(conj),
            _ => None,
        }
    }

    pub fn factors(&self) -> BTreeSet<Factor> {
        self.disjuncts
            .iter()
            .flat_map(|d| d.factors())
            .cloned()
            .collect()
    }

    pub fn mentions(&self, factor: &Factor) -> bool {
        self.disjuncts.iter().any(|d| d.mentions(factor))
    }

    pub fn literal_count(&self) -> usize {
        self.disjuncts.iter().map(Conjunction::len).sum()
    }

    pub fn contains_disjunct(&self, disjunct: &Conjunction) -> bool {
        self.disjuncts.binary_search(disjunct).is_ok()
    }

    pub fn evaluate(&self, mut value_of: impl FnMut(&Factor) -> bool) -> bool {
        self.disjuncts.iter().any(|d| d.evaluate(&mut value_of))
    }

    /// Returns a new formula with `disjunct` added.
    pub fn with_disjunct(&self, disjunct: Conjunction) -> Self {
        Self::new(self.disjuncts.iter().cloned().chain(std::iter::once(disjunct)))
    }

    /// Returns a new formula with the disjunct at `ix` replaced.
    pub fn with_replaced_disjunct(&self, ix: usize, disjunct: Conjunction) -> Self {
        Self::new(self.disjuncts.iter().enumerate().map(|(i, d)| {
            if i == ix {
                disjunct.clone()
            } else {
                d.clone()
            }
        }))
    }

    /// Returns true if some disjunct contains every literal of another disjunct.
    pub fn has_subsumed_disjunct(&self) -> bool {
        self.disjuncts.iter().enumerate().any(|(i, a)| {
            self.disjuncts
                .iter()
                .enumerate()
                .any(|(j, b)| i != j && b.is_subset(a))
        })
    }

    /// Replaces every occurrence of `from` by `to`, keeping polarity. Disjuncts that become
    /// contradictory are dropped.
    pub fn substitute(&self, from: &Factor, to: &Factor) -> Self {
        Self::new(self.disjuncts.iter().filter_map(|d| {
            let positions: Vec<_> = d
                .literals()
                .iter()
                .enumerate()
                .filter_map(|(ix, l)| (l.factor() == from).then(|| ix))
                .collect();
            d.substitute_at(&positions, to)
        }))
    }

    /// Returns every formula obtained by replacing a non-empty subset of the occurrences of
    /// `from` by `to`.
    pub fn partial_substitutions(&self, from: &Factor, to: &Factor) -> Vec<Self> {
        let occurrences: Vec<(usize, usize)> = self
            .disjuncts
            .iter()
            .enumerate()
            .flat_map(|(d_ix, d)| {
                d.literals()
                    .iter()
                    .enumerate()
                    .filter(move |(_, l)| l.factor() == from)
                    .map(move |(l_ix, _)| (d_ix, l_ix))
            })
            .collect();

        let mut results = BTreeSet::new();
        for mask in 1_u64..(1 << occurrences.len().min(63)) {
            let chosen: Vec<_> = occurrences
                .iter()
                .enumerate()
                .filter_map(|(bit, occ)| ((mask >> bit) & 1 == 1).then(|| *occ))
                .collect();
            let formula = Self::new(self.disjuncts.iter().enumerate().filter_map(|(d_ix, d)| {
                let positions: Vec<_> = chosen
                    .iter()
                    .filter_map(|&(c_d, c_l)| (c_d == d_ix).then(|| c_l))
                    .collect();
                d.substitute_at(&positions, to)
            }));
            if !formula.is_empty() {
                results.insert(formula);
            }
        }
        results.into_iter().collect()
    }
}

impl TryFrom<String> for Dnf {
    type Error = ParseFormulaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dnf> for String {
    fn from(dnf: Dnf) -> Self {
        dnf.to_string()
    }
}

impl FromIterator<Conjunction> for Dnf {
    fn from_iter<T: IntoIterator<Item = Conjunction>>(iter: T) -> Self {
        Self::new(iter)
    }
}
