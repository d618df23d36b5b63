// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::InvalidCubeNumeric,
    factor::{Factor, Literal},
    formula::Conjunction,
};
use std::{borrow::Cow, fmt};

/// A product term over a fixed list of variables. `None` marks a variable the term doesn't
/// mention.
#[derive(Clone, Debug, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Cube {
    pub input: Vec<Option<bool>>,
}

impl Cube {
    #[inline]
    pub fn new(input: Vec<Option<bool>>) -> Self {
        Self { input }
    }

    /// A cube mentioning every variable.
    pub fn minterm(values: impl IntoIterator<Item = bool>) -> Self {
        Self {
            input: values.into_iter().map(Some).collect(),
        }
    }

    // 0 is a negative literal, 1 a positive literal, 2 an absent variable.
    pub fn from_numeric(input_numeric: &[u8]) -> Result<Self, InvalidCubeNumeric> {
        let input = input_numeric
            .iter()
            .map(|&val| match val {
                0 => Ok(Some(false)),
                1 => Ok(Some(true)),
                2 => Ok(None),
                value => Err(InvalidCubeNumeric { value }),
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { input })
    }

    /// The number of variables, mentioned or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.input.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn literal_count(&self) -> usize {
        self.input.iter().filter(|c| c.is_some()).count()
    }

    #[inline]
    pub fn is_minterm(&self) -> bool {
        self.input.iter().all(|c| c.is_some())
    }

    #[inline]
    pub fn matrix_display(&self) -> CubeMatrixDisplay<'_> {
        CubeMatrixDisplay::new(self)
    }

    /// Returns true if every point of `other` is a point of `self`.
    pub fn contains(&self, other: &Cube) -> bool {
        self.input
            .iter()
            .zip(&other.input)
            .all(|(&c, &d)| CubeContains::input_contains(c, d) >= CubeContains::Contains)
    }

    pub fn strictly_contains(&self, other: &Cube) -> bool {
        let mut any_strictly = false;
        let all_contain = self.input.iter().zip(&other.input).all(|(&c, &d)| {
            match CubeContains::input_contains(c, d) {
                CubeContains::Strictly => {
                    any_strictly = true;
                    true
                }
                CubeContains::Contains => true,
                CubeContains::DoesNotContain => false,
            }
        });
        all_contain && any_strictly
    }

    /// Every cube obtained by dropping exactly one literal.
    pub fn reductions(&self) -> impl Iterator<Item = Cube> + '_ {
        self.input
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_some())
            .map(move |(ix, _)| {
                let mut input = self.input.clone();
                input[ix] = None;
                Cube { input }
            })
    }

    pub fn evaluate(&self, values: &[bool]) -> bool {
        self.input
            .iter()
            .zip(values)
            .all(|(variable, value)| match variable {
                Some(v) => v == value,
                None => true,
            })
    }

    /// Converts this cube into a conjunction over the given variables.
    pub fn to_conjunction(&self, variables: &[Factor]) -> Conjunction {
        let literals = self
            .input
            .iter()
            .zip(variables)
            .filter_map(|(c, factor)| c.map(|value| Literal::new(factor.clone(), !value)));
        Conjunction::new(literals).expect("variables are distinct so literals never conflict")
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum CubeContains {
    DoesNotContain,
    Contains,
    Strictly,
}

impl CubeContains {
    fn input_contains(c: Option<bool>, d: Option<bool>) -> Self {
        match (c, d) {
            (Some(false), Some(false)) => Self::Contains,
            (Some(false), None | Some(true)) => Self::DoesNotContain,
            (Some(true), Some(false) | None) => Self::DoesNotContain,
            (Some(true), Some(true)) => Self::Contains,
            (None, Some(true) | Some(false)) => Self::Strictly,
            (None, None) => Self::Contains,
        }
    }
}

pub struct CubeMatrixDisplay<'a> {
    cube: &'a Cube,
    format: MatrixDisplayFormat,
    internal_separator: Cow<'a, str>,
}

impl<'a> CubeMatrixDisplay<'a> {
    pub fn new(cube: &'a Cube) -> Self {
        Self {
            cube,
            format: MatrixDisplayFormat::default(),
            internal_separator: Cow::Borrowed(""),
        }
    }

    pub fn with_format(mut self, format: MatrixDisplayFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_internal_separator(mut self, separator: impl Into<Cow<'a, str>>) -> Self {
        self.internal_separator = separator.into();
        self
    }
}

impl<'a> fmt::Display for CubeMatrixDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let len = self.cube.len();
        for (input_ix, &input) in self.cube.input.iter().enumerate() {
            write!(f, "{}", self.format.char_for_input(input))?;
            if input_ix + 1 < len {
                write!(f, "{}", self.internal_separator)?;
            }
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug)]
pub enum MatrixDisplayFormat {
    /// Display a cube using the format `10-1`, with dashes for absent variables.
    Dashes,

    /// Display a cube using the format `1021`, with 2 for absent variables.
    Numeric,
}

impl MatrixDisplayFormat {
    /// Returns the character that would be displayed for an input.
    pub fn char_for_input(self, input: Option<bool>) -> char {
        match input {
            Some(true) => '1',
            Some(false) => '0',
            None => match self {
                Self::Dashes => '-',
                Self::Numeric => '2',
            },
        }
    }
}

impl Default for MatrixDisplayFormat {
    fn default() -> Self {
        Self::Dashes
    }
}
