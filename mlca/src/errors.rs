// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types returned by this crate.

use crate::factor::Factor;

/// An error that occurred while parsing a factor, formula or equivalence relation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseFormulaError {
    #[error("formula is empty")]
    Empty,

    #[error("disjunct {position} of `{input}` is empty")]
    EmptyDisjunct { input: String, position: usize },

    #[error("invalid factor name `{name}`")]
    InvalidFactorName { name: String },

    #[error("conjunction contains both {factor} and ~{factor}")]
    Contradiction { factor: Factor },

    #[error("missing `<->` in equivalence relation `{input}`")]
    MissingEquivalence { input: String },

    #[error(transparent)]
    InvalidEquivalence(#[from] InvalidEquivalence),
}

/// An equivalence relation violated one of its invariants.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidEquivalence {
    #[error("consequent {factor} occurs in its own antecedent")]
    ConsequentInAntecedent { factor: Factor },
}

/// A cube was specified with a numeric value other than 0, 1 or 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid cube value {value} (expected 0, 1 or 2)")]
pub struct InvalidCubeNumeric {
    pub value: u8,
}

/// A data table could not be constructed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidDataTable {
    #[error("row {row} has {actual} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("factor {factor} is listed more than once")]
    DuplicateFactor { factor: Factor },

    #[error("row {row} contains invalid value `{value}` (expected 0 or 1)")]
    InvalidValue { row: usize, value: char },

    #[error(transparent)]
    InvalidFactorName(#[from] ParseFormulaError),
}

/// A factor hierarchy could not be constructed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidHierarchy {
    #[error("factor {factor} appears more than once in the hierarchy")]
    DuplicateFactor { factor: Factor },
}

/// A configuration file could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration value for `{field}`: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Errors returned by the analysis pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("factor {factor} is part of the hierarchy but has no column in the data table")]
    MissingColumn { factor: Factor },

    #[error("{count} circular relations exceed the search limit of {limit}")]
    SearchSpaceTooLarge { count: usize, limit: usize },

    #[error("circular relations have more than {limit} resolutions")]
    TooManyResolutions { limit: usize },

    #[error("{count} factors exceed the enumeration limit of {limit}")]
    TooManyFactors { count: usize, limit: usize },

    #[error(transparent)]
    InvalidHierarchy(#[from] InvalidHierarchy),

    #[error(transparent)]
    InvalidDataTable(#[from] InvalidDataTable),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
