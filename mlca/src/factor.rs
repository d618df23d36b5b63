// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::ParseFormulaError;
use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt, ops::Not, str::FromStr, sync::Arc};

/// A named Boolean variable.
///
/// Factors are cheap to clone and compare by name. Names consist of ASCII alphanumerics and `_`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Factor(Arc<str>);

impl Factor {
    pub fn new(name: impl AsRef<str>) -> Result<Self, ParseFormulaError> {
        let name = name.as_ref();
        if is_valid_name(name) {
            Ok(Self(name.into()))
        } else {
            Err(ParseFormulaError::InvalidFactorName {
                name: name.to_owned(),
            })
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn positive(&self) -> Literal {
        Literal::new(self.clone(), false)
    }

    #[inline]
    pub fn negative(&self) -> Literal {
        Literal::new(self.clone(), true)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

impl fmt::Debug for Factor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Factor {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Factor {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Factor {
    type Err = ParseFormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim())
    }
}

impl TryFrom<String> for Factor {
    type Error = ParseFormulaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Factor> for String {
    fn from(factor: Factor) -> Self {
        factor.0.to_string()
    }
}

/// A factor or its negation.
///
/// Literals order by factor first, so that a sorted conjunction reads alphabetically.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    factor: Factor,
    negated: bool,
}

impl Literal {
    #[inline]
    pub fn new(factor: Factor, negated: bool) -> Self {
        Self { factor, negated }
    }

    #[inline]
    pub fn factor(&self) -> &Factor {
        &self.factor
    }

    #[inline]
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Returns the value this literal takes when its factor has the given value.
    #[inline]
    pub fn evaluate(&self, value: bool) -> bool {
        value != self.negated
    }
}

impl Not for Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        Literal::new(self.factor, !self.negated)
    }
}

impl<'a> Not for &'a Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        Literal::new(self.factor.clone(), !self.negated)
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.negated {
            write!(f, "~{}", self.factor)
        } else {
            write!(f, "{}", self.factor)
        }
    }
}

impl FromStr for Literal {
    type Err = ParseFormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix('~') {
            Some(rest) => Ok(Factor::new(rest.trim())?.negative()),
            None => Ok(Factor::new(s)?.positive()),
        }
    }
}
