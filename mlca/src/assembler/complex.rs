// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Junctor variants of composite antecedents.

use crate::{
    factor::Literal,
    formula::{Conjunction, Dnf},
};
use itertools::Itertools;
use std::collections::BTreeSet;

/// Returns every antecedent that can be built from the literals of `composite`.
///
/// These are all groupings of consecutive literals into disjuncts (from the full disjunction to
/// the full conjunction), and for every grouping with several disjuncts each extension of the
/// disjuncts by further literals of the composite. Formulas in which one disjunct contains
/// another are left out.
///
/// Returns `None` if more than `limit` candidate formulas would have to be built. Candidates are
/// counted before duplicates and subsumed disjuncts are filtered out.
pub fn composite_variants(composite: &Conjunction, limit: usize) -> Option<Vec<Dnf>> {
    let literals = composite.literals();
    let mut variants = BTreeSet::new();
    let mut candidates = 0_usize;

    for pattern in junctor_patterns(literals, limit)? {
        if pattern.len() > 1 {
            candidates = candidates.checked_add(extension_count(&pattern, literals)?)?;
            if candidates > limit {
                return None;
            }
            variants.extend(extensions(&pattern, literals));
        } else {
            variants.insert(Dnf::new(pattern));
        }
    }
    Some(variants.into_iter().collect())
}

/// `2^n`, or `None` if that doesn't fit.
fn subset_count(n: usize) -> Option<usize> {
    u32::try_from(n).ok().and_then(|n| 1_usize.checked_shl(n))
}

/// Splits `literals` into runs of consecutive literals in every possible way. Each run becomes a
/// disjunct. Returns `None` if there are more than `limit` ways.
fn junctor_patterns(literals: &[Literal], limit: usize) -> Option<Vec<Vec<Conjunction>>> {
    let (first, rest) = match literals.split_first() {
        Some(split) => split,
        None => return Some(Vec::new()),
    };
    let count = subset_count(rest.len()).filter(|&count| count <= limit)?;

    let patterns = (0..count)
        .filter_map(|mask| {
            let mut runs: Vec<Vec<Literal>> = vec![vec![first.clone()]];
            for (ix, literal) in rest.iter().enumerate() {
                // A set bit conjoins the literal to the current run.
                if (mask >> (rest.len() - 1 - ix)) & 1 == 1 {
                    runs.last_mut()?.push(literal.clone());
                } else {
                    runs.push(vec![literal.clone()]);
                }
            }
            runs.into_iter()
                .map(Conjunction::new)
                .collect::<Result<Vec<_>, _>>()
                .ok()
        })
        .collect();
    Some(patterns)
}

/// The number of formulas [`extensions`] considers for `pattern`.
fn extension_count(pattern: &[Conjunction], literals: &[Literal]) -> Option<usize> {
    pattern.iter().try_fold(1_usize, |count, disjunct| {
        let missing = literals
            .iter()
            .filter(|literal| !disjunct.contains_literal(literal))
            .count();
        count.checked_mul(subset_count(missing)?)
    })
}

/// Every formula obtained by conjoining each disjunct of `pattern` with a subset of the literals
/// it doesn't contain yet.
fn extensions(pattern: &[Conjunction], literals: &[Literal]) -> Vec<Dnf> {
    pattern
        .iter()
        .map(|disjunct| {
            let missing: Vec<&Literal> = literals
                .iter()
                .filter(|literal| !disjunct.contains_literal(literal))
                .collect();
            missing
                .into_iter()
                .powerset()
                .filter_map(|extra| {
                    Conjunction::new(disjunct.literals().iter().chain(extra).cloned()).ok()
                })
                .collect::<Vec<_>>()
        })
        .multi_cartesian_product()
        .filter_map(|disjuncts| {
            let count = disjuncts.len();
            let formula = Dnf::new(disjuncts);
            // Duplicated disjuncts collapse when canonicalized.
            (formula.len() == count && !formula.has_subsumed_disjunct()).then(|| formula)
        })
        .collect()
}
