// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::formula::{parse::EMPTY_FORMULA, Conjunction, Dnf, Equivalence};
use itertools::{Itertools, Position};
use std::{borrow::Cow, fmt};

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.literals().iter().format("*"))
    }
}

impl fmt::Display for Dnf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.algebraic_display())
    }
}

impl fmt::Display for Equivalence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} <-> {}", self.antecedent(), self.consequent())
    }
}

impl Dnf {
    #[inline]
    pub fn algebraic_display(&self) -> DnfDisplay<'_> {
        DnfDisplay::new(self)
    }
}

/// Displays a formula with configurable operators, e.g. `A∧¬B ∨ C`.
#[derive(Clone, Debug)]
pub struct DnfDisplay<'a> {
    formula: &'a Dnf,
    and: Cow<'a, str>,
    or: Cow<'a, str>,
    not: Cow<'a, str>,
}

impl<'a> DnfDisplay<'a> {
    pub fn new(formula: &'a Dnf) -> Self {
        Self {
            formula,
            and: Cow::Borrowed("*"),
            or: Cow::Borrowed(" + "),
            not: Cow::Borrowed("~"),
        }
    }

    pub fn with_and(mut self, and: impl Into<Cow<'a, str>>) -> Self {
        self.and = and.into();
        self
    }

    pub fn with_or(mut self, or: impl Into<Cow<'a, str>>) -> Self {
        self.or = or.into();
        self
    }

    pub fn with_not(mut self, not: impl Into<Cow<'a, str>>) -> Self {
        self.not = not.into();
        self
    }

    fn write_conjunction(&self, f: &mut fmt::Formatter, conj: &Conjunction) -> fmt::Result {
        for literal in conj.literals().iter().with_position() {
            let (literal, last) = match literal {
                Position::First(l) | Position::Middle(l) => (l, false),
                Position::Last(l) | Position::Only(l) => (l, true),
            };
            if literal.is_negated() {
                write!(f, "{}", self.not)?;
            }
            write!(f, "{}", literal.factor())?;
            if !last {
                write!(f, "{}", self.and)?;
            }
        }
        Ok(())
    }
}

impl<'a> fmt::Display for DnfDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.formula.is_empty() {
            return write!(f, "{}", EMPTY_FORMULA);
        }
        for disjunct in self.formula.disjuncts().iter().with_position() {
            match disjunct {
                Position::First(conj) | Position::Middle(conj) => {
                    self.write_conjunction(f, conj)?;
                    write!(f, "{}", self.or)?;
                }
                Position::Last(conj) | Position::Only(conj) => {
                    self.write_conjunction(f, conj)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_operators() {
        let formula: Dnf = "~A*B + C".parse().unwrap();
        let display = formula
            .algebraic_display()
            .with_and(" & ")
            .with_or(" | ")
            .with_not("!");
        assert_eq!(display.to_string(), "!A & B | C");
        assert_eq!(Dnf::default().to_string(), "(none)");
    }
}
