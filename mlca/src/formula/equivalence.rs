// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{InvalidEquivalence, ParseFormulaError},
    factor::{Factor, Literal},
    formula::Dnf,
};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeSet};

/// An equivalence relation `antecedent <-> consequent`.
///
/// The consequent never occurs in its own antecedent. Relations sort by consequent first.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Equivalence {
    antecedent: Dnf,
    consequent: Factor,
}

impl Equivalence {
    pub fn new(antecedent: Dnf, consequent: Factor) -> Result<Self, InvalidEquivalence> {
        if antecedent.mentions(&consequent) {
            return Err(InvalidEquivalence::ConsequentInAntecedent { factor: consequent });
        }
        Ok(Self {
            antecedent,
            consequent,
        })
    }

    #[inline]
    pub fn antecedent(&self) -> &Dnf {
        &self.antecedent
    }

    #[inline]
    pub fn consequent(&self) -> &Factor {
        &self.consequent
    }

    /// The factors of the antecedent.
    #[inline]
    pub fn causes(&self) -> BTreeSet<Factor> {
        self.antecedent.factors()
    }

    /// The factors of the antecedent and the consequent.
    pub fn factors(&self) -> BTreeSet<Factor> {
        let mut factors = self.antecedent.factors();
        factors.insert(self.consequent.clone());
        factors
    }

    pub fn mentions(&self, factor: &Factor) -> bool {
        &self.consequent == factor || self.antecedent.mentions(factor)
    }

    /// Returns the antecedent literal if the antecedent is a single literal.
    #[inline]
    pub fn single_cause(&self) -> Option<&Literal> {
        self.antecedent.as_literal()
    }

    /// Returns true if both sides take the same value under the assignment.
    pub fn holds(&self, mut value_of: impl FnMut(&Factor) -> bool) -> bool {
        self.antecedent.evaluate(&mut value_of) == value_of(&self.consequent)
    }
}

impl PartialOrd for Equivalence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Equivalence {
    fn cmp(&self, other: &Self) -> Ordering {
        self.consequent
            .cmp(&other.consequent)
            .then_with(|| self.antecedent.cmp(&other.antecedent))
    }
}

impl TryFrom<String> for Equivalence {
    type Error = ParseFormulaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Equivalence> for String {
    fn from(relation: Equivalence) -> Self {
        relation.to_string()
    }
}
