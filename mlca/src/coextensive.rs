// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Factors with identical columns.
//!
//! Co-extensive factors are indistinguishable in the data, so relations are derived for one
//! representative per level and then copied over to the others.

use crate::{
    factor::Factor,
    formula::{Dnf, Equivalence},
    hierarchy::FactorHierarchy,
    table::DataTable,
};
use std::collections::BTreeSet;
use tracing::debug;

/// One group of co-extensive factors, split up by level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoextensiveGroup {
    /// `(level, representative, other members on that level)`, by ascending level.
    levels: Vec<(usize, Factor, Vec<Factor>)>,
}

impl CoextensiveGroup {
    fn new(members: &[Factor], hierarchy: &FactorHierarchy) -> Self {
        let mut levels = Vec::new();
        for (level, orders) in hierarchy.levels().iter().enumerate() {
            // The representative is the member of highest causal order, first listed on ties.
            let representative = orders
                .iter()
                .rev()
                .find_map(|order| order.iter().find(|f| members.contains(f)));
            if let Some(representative) = representative {
                let others = orders
                    .iter()
                    .flatten()
                    .filter(|f| *f != representative && members.contains(f))
                    .cloned()
                    .collect();
                levels.push((level, representative.clone(), others));
            }
        }
        Self { levels }
    }

    pub fn representatives(&self) -> impl Iterator<Item = &Factor> + '_ {
        self.levels.iter().map(|(_, rep, _)| rep)
    }

    /// Members that aren't the representative of their level.
    pub fn redundant_members(&self) -> impl Iterator<Item = &Factor> + '_ {
        self.levels.iter().flat_map(|(_, _, others)| others)
    }

    /// All members on the given level, representative first.
    fn level_members(&self, level: usize) -> Vec<Factor> {
        self.levels
            .iter()
            .filter(|(l, _, _)| *l == level)
            .flat_map(|(_, rep, others)| std::iter::once(rep).chain(others))
            .cloned()
            .collect()
    }
}

/// All co-extensive groups among a set of factors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoextensiveSets {
    groups: Vec<CoextensiveGroup>,
}

impl CoextensiveSets {
    pub fn detect(table: &DataTable, hierarchy: &FactorHierarchy, candidates: &[Factor]) -> Self {
        let groups: Vec<_> = table
            .coextensive_groups(candidates)
            .iter()
            .map(|members| CoextensiveGroup::new(members, hierarchy))
            .collect();
        if !groups.is_empty() {
            debug!(groups = groups.len(), "found co-extensive factors");
        }
        Self { groups }
    }

    #[inline]
    pub fn groups(&self) -> &[CoextensiveGroup] {
        &self.groups
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn redundant_members(&self) -> BTreeSet<Factor> {
        self.groups
            .iter()
            .flat_map(CoextensiveGroup::redundant_members)
            .cloned()
            .collect()
    }

    /// Same-level partners of `factor`, excluding itself.
    fn partners(&self, factor: &Factor, hierarchy: &FactorHierarchy) -> Vec<Factor> {
        let level = match hierarchy.level_of(factor) {
            Some(level) => level,
            None => return Vec::new(),
        };
        self.groups
            .iter()
            .map(|group| group.level_members(level))
            .find(|members| members.contains(factor))
            .map(|members| members.into_iter().filter(|f| f != factor).collect())
            .unwrap_or_default()
    }

    /// Restores relations for co-extensive effects after minimizing only the representatives.
    ///
    /// For a representative `e` and another member `f`, `D <-> e` yields `D[f := e] <-> f`,
    /// unless `D` mentions `f` while `f` precedes `e`, or `D` mentions a factor of higher order
    /// than `f`.
    pub fn expand_top_down(
        &self,
        relations: &[Equivalence],
        hierarchy: &FactorHierarchy,
    ) -> Vec<Equivalence> {
        let mut expanded: BTreeSet<Equivalence> = relations.iter().cloned().collect();
        for group in &self.groups {
            for (level, representative, others) in &group.levels {
                let rep_order = hierarchy.order_of(representative);
                for member in others {
                    let member_order = hierarchy.order_of(member);
                    for relation in relations
                        .iter()
                        .filter(|r| r.consequent() == representative)
                    {
                        let antecedent = relation.antecedent();
                        if antecedent.mentions(member) && member_order < rep_order {
                            continue;
                        }
                        let outranked = antecedent.factors().iter().any(|f| {
                            f != representative
                                && hierarchy.level_of(f) == Some(*level)
                                && hierarchy.order_of(f) > member_order
                        });
                        if outranked {
                            continue;
                        }
                        let substituted = antecedent.substitute(member, representative);
                        if let Ok(relation) = Equivalence::new(substituted, member.clone()) {
                            expanded.insert(relation);
                        }
                    }
                }
            }
        }
        expanded.into_iter().collect()
    }

    /// Restores relations after searching with only the representatives.
    ///
    /// Members inherit their representative's relations, same-level members become equivalent to
    /// each other, antecedents mentioning a member are rewritten with every partial substitution
    /// by its partners, and members on adjacent levels yield constitution relations.
    pub fn expand_bottom_up(
        &self,
        relations: &[Equivalence],
        hierarchy: &FactorHierarchy,
    ) -> Vec<Equivalence> {
        let mut expanded: BTreeSet<Equivalence> = relations.iter().cloned().collect();

        for group in &self.groups {
            for (_, representative, others) in &group.levels {
                for relation in relations
                    .iter()
                    .filter(|r| r.consequent() == representative)
                {
                    for member in others {
                        if let Ok(copy) =
                            Equivalence::new(relation.antecedent().clone(), member.clone())
                        {
                            expanded.insert(copy);
                        }
                    }
                }
            }
        }

        let snapshot: Vec<Equivalence> = expanded.iter().cloned().collect();
        for relation in &snapshot {
            for factor in relation.causes() {
                for partner in self.partners(&factor, hierarchy) {
                    for antecedent in relation.antecedent().partial_substitutions(&factor, &partner)
                    {
                        if let Ok(substituted) =
                            Equivalence::new(antecedent, relation.consequent().clone())
                        {
                            expanded.insert(substituted);
                        }
                    }
                }
            }
        }

        for group in &self.groups {
            for (level, _, _) in &group.levels {
                let members = group.level_members(*level);
                for a in &members {
                    for b in &members {
                        if a != b {
                            expanded.insert(equivalent(a, b));
                        }
                    }
                }
                let lower = match level.checked_sub(1) {
                    Some(lower) => group.level_members(lower),
                    None => continue,
                };
                for lower in &lower {
                    for upper in &members {
                        expanded.insert(equivalent(lower, upper));
                    }
                }
            }
        }

        expanded.into_iter().collect()
    }
}

fn equivalent(antecedent: &Factor, consequent: &Factor) -> Equivalence {
    Equivalence::new(Dnf::literal(antecedent.positive()), consequent.clone())
        .expect("distinct factors form a valid relation")
}
