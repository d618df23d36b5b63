// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing of the `A*~B + C <-> D` syntax.

use crate::{
    errors::ParseFormulaError,
    factor::{Factor, Literal},
    formula::{Conjunction, Dnf, Equivalence},
};
use std::str::FromStr;

pub(super) const EMPTY_FORMULA: &str = "(none)";

impl FromStr for Conjunction {
    type Err = ParseFormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let literals = s
            .split('*')
            .map(|lit| lit.parse::<Literal>())
            .collect::<Result<Vec<_>, _>>()?;
        Conjunction::new(literals)
    }
}

impl FromStr for Dnf {
    type Err = ParseFormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseFormulaError::Empty);
        }
        if s == EMPTY_FORMULA {
            return Ok(Dnf::default());
        }

        let disjuncts = s
            .split('+')
            .enumerate()
            .map(|(position, disjunct)| {
                if disjunct.trim().is_empty() {
                    Err(ParseFormulaError::EmptyDisjunct {
                        input: s.to_owned(),
                        position,
                    })
                } else {
                    disjunct.parse::<Conjunction>()
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Dnf::new(disjuncts))
    }
}

impl FromStr for Equivalence {
    type Err = ParseFormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (antecedent, consequent) =
            s.split_once("<->")
                .ok_or_else(|| ParseFormulaError::MissingEquivalence {
                    input: s.to_owned(),
                })?;
        let antecedent: Dnf = antecedent.parse()?;
        let consequent: Factor = consequent.parse()?;
        Ok(Equivalence::new(antecedent, consequent)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dnf() {
        let formula: Dnf = " A * ~B+C ".parse().unwrap();
        assert_eq!(formula.len(), 2);
        assert_eq!(formula.to_string(), "A*~B + C");
        assert_eq!("(none)".parse::<Dnf>().unwrap(), Dnf::default());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Dnf>(), Err(ParseFormulaError::Empty));
        assert!(matches!(
            "A + ".parse::<Dnf>(),
            Err(ParseFormulaError::EmptyDisjunct { position: 1, .. })
        ));
        assert!(matches!(
            "A + B-C".parse::<Dnf>(),
            Err(ParseFormulaError::InvalidFactorName { .. })
        ));
        assert!(matches!(
            "A*B".parse::<Equivalence>(),
            Err(ParseFormulaError::MissingEquivalence { .. })
        ));
        assert!(matches!(
            "A*~B <-> B".parse::<Equivalence>(),
            Err(ParseFormulaError::InvalidEquivalence(_))
        ));
    }

    #[test]
    fn test_parse_equivalence() {
        let relation: Equivalence = "B*A + ~C <-> D".parse().unwrap();
        assert_eq!(relation.consequent().name(), "D");
        assert_eq!(relation.to_string(), "A*B + ~C <-> D");
    }
}
