// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Strategies for formulas and data tables over a small alphabet of factors.

use crate::{
    factor::{Factor, Literal},
    formula::{Conjunction, Dnf},
    table::DataTable,
};
use proptest::prelude::*;

/// Factor names used by the formula strategies.
pub const ALPHABET: &[&str] = &["A", "B", "C", "D", "E"];

pub fn arb_factor() -> impl Strategy<Value = Factor> {
    prop::sample::select(ALPHABET).prop_map(factor)
}

impl Arbitrary for Literal {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (arb_factor(), any::<bool>())
            .prop_map(|(factor, negated)| Literal::new(factor, negated))
            .boxed()
    }
}

impl Arbitrary for Conjunction {
    /// Maximum number of literals; defaults to 3.
    type Parameters = Option<usize>;
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(params: Self::Parameters) -> Self::Strategy {
        let max_len = params.unwrap_or(3).clamp(1, ALPHABET.len());
        (
            prop::sample::subsequence(ALPHABET, 1..=max_len),
            prop::collection::vec(any::<bool>(), max_len),
        )
            .prop_map(|(names, negations)| {
                let literals = names
                    .into_iter()
                    .zip(negations)
                    .map(|(name, negated)| Literal::new(factor(name), negated));
                Conjunction::new(literals).expect("literals are over distinct factors")
            })
            .boxed()
    }
}

impl Arbitrary for Dnf {
    /// Maximum number of disjuncts; defaults to 4.
    type Parameters = Option<usize>;
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(params: Self::Parameters) -> Self::Strategy {
        let max_disjuncts = params.unwrap_or(4);
        prop::collection::vec(any::<Conjunction>(), 0..=max_disjuncts)
            .prop_map(Dnf::new)
            .boxed()
    }
}

/// Tables over the factors `A`, `B`, ... with between 1 and `max_rows` rows.
pub fn arb_table(factor_count: usize, max_rows: usize) -> impl Strategy<Value = DataTable> {
    let factors: Vec<Factor> = (b'A'..=b'Z')
        .take(factor_count)
        .map(|ch| factor(&char::from(ch).to_string()))
        .collect();
    prop::collection::vec(
        prop::collection::vec(any::<bool>(), factor_count),
        1..=max_rows.max(1),
    )
    .prop_map(move |rows| {
        DataTable::from_rows(factors.clone(), rows).expect("rows have one value per factor")
    })
}

fn factor(name: &str) -> Factor {
    Factor::new(name).expect("alphabet names are valid factor names")
}
