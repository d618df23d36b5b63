// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    factor::Factor,
    formula::Equivalence,
    hierarchy::{FactorHierarchy, FactorSet},
    ordering::CausalOrdering,
};
use serde::Serialize;
use std::fmt;

/// A set of causal relations per level, as assembled from candidate relations.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CandidateStructure {
    levels: Vec<Vec<Equivalence>>,
}

impl CandidateStructure {
    /// Creates a structure, sorting the relations of every level and removing duplicates.
    pub fn new(levels: Vec<Vec<Equivalence>>) -> Self {
        let levels = levels
            .into_iter()
            .map(|mut relations| {
                relations.sort();
                relations.dedup();
                relations
            })
            .collect();
        Self { levels }
    }

    #[inline]
    pub fn levels(&self) -> &[Vec<Equivalence>] {
        &self.levels
    }

    #[inline]
    pub fn level(&self, level: usize) -> Option<&[Equivalence]> {
        self.levels.get(level).map(Vec::as_slice)
    }

    pub fn relations(&self) -> impl Iterator<Item = &Equivalence> + '_ {
        self.levels.iter().flatten()
    }

    pub fn relation_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// Returns true if every level's relations also appear on the same level of `other`.
    pub fn is_fragment_of(&self, other: &Self) -> bool {
        self.levels.len() == other.levels.len()
            && self
                .levels
                .iter()
                .zip(&other.levels)
                .all(|(ours, theirs)| ours.iter().all(|r| theirs.binary_search(r).is_ok()))
    }

    /// Returns true if a factor listed in a later causal order than another factor on its level
    /// is a direct or indirect cause of it.
    pub fn violates_order(&self, hierarchy: &FactorHierarchy) -> bool {
        self.levels.iter().enumerate().any(|(level, relations)| {
            hierarchy
                .order_constraints(level)
                .iter()
                .any(|(earlier, later)| reaches(relations, later, earlier))
        })
    }
}

impl fmt::Display for CandidateStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (level, relations) in self.levels.iter().enumerate() {
            if level > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}: ", level)?;
            for (ix, relation) in relations.iter().enumerate() {
                if ix > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", relation)?;
            }
        }
        Ok(())
    }
}

/// Returns true if `from` causes `to` through a chain of relations.
fn reaches(relations: &[Equivalence], from: &Factor, to: &Factor) -> bool {
    let mut reached = vec![from];
    let mut ix = 0;
    while let Some(&cause) = reached.get(ix) {
        for relation in relations.iter().filter(|r| r.antecedent().mentions(cause)) {
            let effect = relation.consequent();
            if effect == to {
                return true;
            }
            if !reached.contains(&effect) {
                reached.push(effect);
            }
        }
        ix += 1;
    }
    false
}

/// Removes duplicates and every structure that is a fragment of another one. The result is
/// sorted.
pub fn remove_fragments(mut structures: Vec<CandidateStructure>) -> Vec<CandidateStructure> {
    structures.sort();
    structures.dedup();
    let keep: Vec<bool> = structures
        .iter()
        .enumerate()
        .map(|(ix, structure)| {
            !structures
                .iter()
                .enumerate()
                .any(|(other_ix, other)| other_ix != ix && structure.is_fragment_of(other))
        })
        .collect();
    structures
        .into_iter()
        .zip(keep)
        .filter_map(|(structure, keep)| keep.then(|| structure))
        .collect()
}

/// The causal relations and causal ordering of one level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LevelModel {
    pub ordering: CausalOrdering,
    pub relations: Vec<Equivalence>,
}

/// A complete, acyclic causal model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CausalModel {
    pub levels: Vec<LevelModel>,
    /// Constitution relations between the levels. These are shared by every model.
    pub constitution: Vec<Equivalence>,
}

impl CausalModel {
    /// Places the factors of every level according to `structure`.
    pub fn new(
        structure: &CandidateStructure,
        hierarchy: &FactorHierarchy,
        constitution: &[Equivalence],
    ) -> Self {
        let levels: Vec<LevelModel> = structure
            .levels()
            .iter()
            .enumerate()
            .map(|(level, relations)| LevelModel {
                ordering: CausalOrdering::new(
                    relations,
                    &FactorSet::Flat(hierarchy.level_factors(level)),
                ),
                relations: relations.clone(),
            })
            .collect();
        Self {
            levels,
            constitution: constitution.to_vec(),
        }
    }

    pub fn relations(&self) -> impl Iterator<Item = &Equivalence> + '_ {
        self.levels.iter().flat_map(|level| &level.relations)
    }

    pub fn is_acyclic(&self) -> bool {
        self.levels.iter().all(|level| level.ordering.is_transitive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure(levels: &[&[&str]]) -> CandidateStructure {
        CandidateStructure::new(
            levels
                .iter()
                .map(|level| level.iter().map(|s| s.parse().unwrap()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_remove_fragments() {
        let structures = vec![
            structure(&[&["A <-> B"], &[]]),
            structure(&[&["A <-> B", "B <-> C"], &[]]),
            structure(&[&["A <-> B", "B <-> C"], &[]]),
            structure(&[&["A <-> C"], &["X <-> Y"]]),
        ];
        let kept = remove_fragments(structures);
        assert_eq!(
            kept,
            vec![
                structure(&[&["A <-> B", "B <-> C"], &[]]),
                structure(&[&["A <-> C"], &["X <-> Y"]]),
            ]
        );
    }

    #[test]
    fn test_violates_order() {
        let level = |names: &[&str]| -> Vec<Factor> {
            names.iter().map(|n| Factor::new(n).unwrap()).collect()
        };
        let hierarchy =
            FactorHierarchy::new(vec![vec![level(&["A"]), level(&["B"]), level(&["C"])]]).unwrap();
        assert!(!structure(&[&["A <-> B", "B <-> C"]]).violates_order(&hierarchy));
        assert!(structure(&[&["C <-> B", "A <-> C"]]).violates_order(&hierarchy));
        assert!(structure(&[&["~B <-> A"]]).violates_order(&hierarchy));
    }

    #[test]
    fn test_causal_model() {
        let level = |names: &[&str]| -> Vec<Factor> {
            names.iter().map(|n| Factor::new(n).unwrap()).collect()
        };
        let hierarchy =
            FactorHierarchy::from_levels(vec![level(&["A", "B", "C"]), level(&["X"])]).unwrap();
        let constitution: Vec<Equivalence> = vec!["A + B <-> X".parse().unwrap()];
        let model = CausalModel::new(
            &structure(&[&["A*B <-> C"], &[]]),
            &hierarchy,
            &constitution,
        );
        assert!(model.is_acyclic());
        assert_eq!(model.relations().count(), 1);
        assert_eq!(model.levels[0].ordering.orders().len(), 2);
        assert_eq!(model.constitution, constitution);
    }
}
