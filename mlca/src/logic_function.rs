// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    cover::Cover, cube::Cube, factor::Factor, formula::Dnf, hierarchy::FactorHierarchy,
    table::DataTable,
};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// The partial Boolean function a data table defines for one target factor.
///
/// Each row contributes a minterm over `variables` labelled with the target's value. Minterms
/// observed with both labels are unclassifiable and dropped.
#[derive(Clone, Debug)]
pub struct InstanceFunction {
    pub target: Factor,
    pub variables: Vec<Factor>,
    pub on_set: Cover,
    pub off_set: Cover,
}

impl InstanceFunction {
    /// Builds the instance function of `target`. Only factors on the target's level or the level
    /// directly below take part.
    pub fn new(table: &DataTable, hierarchy: &FactorHierarchy, target: &Factor) -> Self {
        let variables: Vec<Factor> = match hierarchy.level_of(target) {
            Some(level) => {
                let below = level.checked_sub(1).map(|l| hierarchy.level_factors(l));
                below
                    .into_iter()
                    .flatten()
                    .chain(hierarchy.level_factors(level))
                    .filter(|f| f != target && table.contains(f))
                    .collect()
            }
            None => Vec::new(),
        };
        Self::with_variables(table, target, variables)
    }

    pub fn with_variables(table: &DataTable, target: &Factor, variables: Vec<Factor>) -> Self {
        let mut labels: BTreeMap<Cube, (bool, bool)> = BTreeMap::new();
        for row in table.rows() {
            let label = match row.value(target) {
                Some(label) => label,
                None => continue,
            };
            let minterm = Cube::minterm(
                variables
                    .iter()
                    .map(|f| row.value(f).unwrap_or(false)),
            );
            let seen = labels.entry(minterm).or_default();
            if label {
                seen.0 = true;
            } else {
                seen.1 = true;
            }
        }

        let mut on_set = Vec::new();
        let mut off_set = Vec::new();
        let mut contradictory = 0;
        for (minterm, seen) in labels {
            match seen {
                (true, false) => on_set.push(minterm),
                (false, true) => off_set.push(minterm),
                _ => contradictory += 1,
            }
        }
        if contradictory > 0 {
            debug!(
                effect = %target,
                contradictory,
                "dropped minterms observed with both values"
            );
        }

        let function = Self {
            target: target.clone(),
            variables,
            on_set: Cover::new(on_set),
            off_set: Cover::new(off_set),
        };
        trace!(
            effect = %target,
            on_set = %function.on_set.matrix_display().with_cube_separator(" ", false),
            off_set = %function.off_set.matrix_display().with_cube_separator(" ", false),
            "built instance function"
        );
        function
    }

    /// An instance function without both true and false minterms has no minimal antecedent.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.on_set.is_empty() || self.off_set.is_empty()
    }

    /// Returns every minimal DNF over `variables` equivalent to this function on its observed
    /// minterms.
    pub fn minimize(&self) -> Vec<Dnf> {
        if self.is_degenerate() {
            return Vec::new();
        }
        let primes = self.on_set.prime_implicants(&self.off_set);
        debug!(
            effect = %self.target,
            primes = %primes.algebraic_display(&self.variables),
            "computed prime implicants"
        );
        let mut solutions: Vec<Dnf> = primes
            .minimal_covers(&self.on_set)
            .iter()
            .map(|cover| cover.to_dnf(&self.variables))
            .collect();
        solutions.sort();
        solutions.dedup();
        solutions
    }
}
