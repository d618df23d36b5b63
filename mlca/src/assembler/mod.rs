// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembly of candidate relations into complete causal structures.
//!
//! Every level is split into clusters of connected factors that are solved independently. A
//! cluster's solutions combine one resolution of its circular relations, one choice among the
//! relations competing for an effect, and all relations without competitors.

mod circular;
mod complex;
mod model;

pub use circular::*;
pub use complex::*;
pub use model::*;

use crate::{
    cluster::Clusters,
    config::{AssemblyLimits, StructureMode},
    errors::ModelError,
    factor::Factor,
    formula::Equivalence,
    hierarchy::{FactorHierarchy, FactorSet},
};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Assembles the causal relations of every level into candidate structures.
///
/// `level_relations` holds the causal relations of each level of `hierarchy`. Returns the sorted
/// structures without duplicates or fragments.
pub fn find_structures(
    level_relations: &[Vec<Equivalence>],
    hierarchy: &FactorHierarchy,
    mode: StructureMode,
    limits: AssemblyLimits,
) -> Result<Vec<CandidateStructure>, ModelError> {
    let mut per_level: Vec<Vec<Vec<Equivalence>>> = Vec::with_capacity(level_relations.len());
    for (level, relations) in level_relations.iter().enumerate() {
        let solutions = solve_level(relations, &hierarchy.level_factors(level), mode, limits)?;
        debug!(
            level,
            relations = relations.len(),
            solutions = solutions.len(),
            "solved level"
        );
        per_level.push(solutions);
    }

    let structures = remove_fragments(combine_levels(per_level));
    info!(structures = structures.len(), "assembled candidate structures");
    Ok(structures)
}

/// Combines one solution of every level into structures, for all choices of solutions.
pub fn combine_levels(per_level: Vec<Vec<Vec<Equivalence>>>) -> Vec<CandidateStructure> {
    per_level
        .into_iter()
        .fold(vec![Vec::new()], |partials: Vec<Vec<Vec<Equivalence>>>, solutions| {
            partials
                .iter()
                .flat_map(|partial| {
                    solutions.iter().map(move |solution| {
                        let mut extended = partial.clone();
                        extended.push(solution.clone());
                        extended
                    })
                })
                .collect()
        })
        .into_iter()
        .map(CandidateStructure::new)
        .collect()
}

/// Solves one level by solving each of its clusters and combining their solutions.
pub fn solve_level(
    relations: &[Equivalence],
    level_factors: &[Factor],
    mode: StructureMode,
    limits: AssemblyLimits,
) -> Result<Vec<Vec<Equivalence>>, ModelError> {
    let clusters = Clusters::new(relations, &FactorSet::Flat(level_factors.to_vec()));
    let mut solutions: Vec<Vec<Equivalence>> = vec![Vec::new()];

    for cluster in clusters.groups() {
        let cluster_relations: Vec<Equivalence> = relations
            .iter()
            .filter(|relation| cluster.contains(relation.consequent()))
            .cloned()
            .collect();
        let cluster_solutions = solve_cluster(&cluster_relations, mode, limits)?;
        solutions = concat_product(&solutions, &cluster_solutions);
    }

    Ok(canonicalize(solutions))
}

/// Solves the relations of one connected cluster.
pub fn solve_cluster(
    relations: &[Equivalence],
    mode: StructureMode,
    limits: AssemblyLimits,
) -> Result<Vec<Vec<Equivalence>>, ModelError> {
    if relations.len() <= 1 {
        return Ok(vec![relations.to_vec()]);
    }

    let circular = circular_relations(relations);
    let resolutions = resolve_circular(&circular, mode, limits)?;

    // Effects with several candidates need one choice each, unless all candidates are circular.
    let mut effects: Vec<&Factor> = Vec::new();
    for relation in relations {
        if !effects.contains(&relation.consequent()) {
            effects.push(relation.consequent());
        }
    }
    let mut choices: Vec<Vec<Vec<Equivalence>>> = Vec::new();
    let mut mandatory: Vec<Equivalence> = Vec::new();
    for effect in effects {
        let candidates: Vec<&Equivalence> = relations
            .iter()
            .filter(|r| r.consequent() == effect)
            .collect();
        let non_circular: Vec<Equivalence> = candidates
            .iter()
            .filter(|r| !circular.contains(*r))
            .map(|&r| r.clone())
            .collect();
        if candidates.len() > 1 && !non_circular.is_empty() {
            choices.push(non_circular.into_iter().map(|r| vec![r]).collect());
        } else {
            mandatory.extend(non_circular);
        }
    }

    let mut solutions: Vec<Vec<Equivalence>> = vec![Vec::new()];
    for choice in &choices {
        solutions = concat_product(&solutions, choice);
    }
    if !resolutions.is_empty() {
        solutions = solutions
            .iter()
            .flat_map(|chosen| {
                resolutions.iter().map(move |resolution| {
                    // The circular group wins over a competing choice for the same effect.
                    let resolved: BTreeSet<&Factor> =
                        resolution.iter().map(|r| r.consequent()).collect();
                    resolution
                        .iter()
                        .chain(chosen.iter().filter(|r| !resolved.contains(r.consequent())))
                        .cloned()
                        .collect()
                })
            })
            .collect();
    }
    for solution in &mut solutions {
        solution.extend(mandatory.iter().cloned());
    }

    let single_effect = relations
        .iter()
        .all(|r| r.consequent() == relations[0].consequent());
    if !single_effect {
        let required: BTreeSet<Factor> = relations.iter().flat_map(Equivalence::factors).collect();
        solutions.retain(|solution| {
            let mentioned: BTreeSet<Factor> =
                solution.iter().flat_map(Equivalence::factors).collect();
            mentioned.is_superset(&required)
        });
    }

    debug!(
        relations = relations.len(),
        circular = circular.len(),
        choices = choices.len(),
        solutions = solutions.len(),
        "solved cluster"
    );
    Ok(canonicalize(solutions))
}

/// Concatenates every solution in `left` with every solution in `right`.
fn concat_product(
    left: &[Vec<Equivalence>],
    right: &[Vec<Equivalence>],
) -> Vec<Vec<Equivalence>> {
    left.iter()
        .flat_map(|l| {
            right
                .iter()
                .map(move |r| l.iter().chain(r).cloned().collect())
        })
        .collect()
}

fn canonicalize(solutions: Vec<Vec<Equivalence>>) -> Vec<Vec<Equivalence>> {
    let solutions: BTreeSet<Vec<Equivalence>> = solutions
        .into_iter()
        .map(|mut solution| {
            solution.sort();
            solution.dedup();
            solution
        })
        .collect();
    solutions.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relations(specs: &[&str]) -> Vec<Equivalence> {
        specs.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn factors(names: &[&str]) -> Vec<Factor> {
        names.iter().map(|n| Factor::new(n).unwrap()).collect()
    }

    fn rendered(solutions: &[Vec<Equivalence>]) -> Vec<Vec<String>> {
        solutions
            .iter()
            .map(|s| s.iter().map(|r| r.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_mutual_causation() {
        let solutions = solve_level(
            &relations(&["A <-> B", "B <-> A"]),
            &factors(&["A", "B"]),
            StructureMode::Simple,
            AssemblyLimits::default(),
        )
        .unwrap();
        assert_eq!(rendered(&solutions), [vec!["B <-> A"], vec!["A <-> B"]]);
    }

    #[test]
    fn test_competing_causes() {
        let candidates = relations(&["A <-> C", "B <-> C"]);
        let solutions = solve_level(
            &candidates,
            &factors(&["A", "B", "C"]),
            StructureMode::Simple,
            AssemblyLimits::default(),
        )
        .unwrap();
        assert_eq!(rendered(&solutions), [vec!["A <-> C"], vec!["B <-> C"]]);
    }

    #[test]
    fn test_mandatory_relations() {
        let solutions = solve_level(
            &relations(&["A <-> B", "B <-> A", "B*D <-> E"]),
            &factors(&["A", "B", "D", "E"]),
            StructureMode::Simple,
            AssemblyLimits::default(),
        )
        .unwrap();
        assert_eq!(
            rendered(&solutions),
            [
                vec!["B <-> A", "B*D <-> E"],
                vec!["A <-> B", "B*D <-> E"],
            ]
        );
    }

    #[test]
    fn test_circular_wins_conflict() {
        // B has a circular and a non-circular candidate.
        let solutions = solve_cluster(
            &relations(&["A <-> B", "B <-> A", "C*D <-> B", "B <-> C"]),
            StructureMode::Simple,
            AssemblyLimits::default(),
        )
        .unwrap();
        assert_eq!(solutions.len(), 1);
        for solution in &solutions {
            let effects: Vec<_> = solution.iter().map(|r| r.consequent()).collect();
            let unique: BTreeSet<_> = effects.iter().collect();
            assert_eq!(effects.len(), unique.len(), "one relation per effect");
        }
    }

    #[test]
    fn test_unconnected_clusters() {
        let level = relations(&["A <-> B", "B <-> A", "C <-> D", "E <-> D"]);
        let solutions = solve_level(
            &level,
            &factors(&["A", "B", "C", "D", "E"]),
            StructureMode::Simple,
            AssemblyLimits::default(),
        )
        .unwrap();
        assert_eq!(solutions.len(), 4);
        assert!(solutions.iter().all(|s| s.len() == 2));
    }

    #[test]
    fn test_find_structures() {
        let hierarchy = FactorHierarchy::from_levels(vec![
            factors(&["A", "B"]),
            factors(&["X", "Y"]),
        ])
        .unwrap();
        let structures = find_structures(
            &[relations(&["A <-> B", "B <-> A"]), relations(&["X <-> Y"])],
            &hierarchy,
            StructureMode::Simple,
            AssemblyLimits::default(),
        )
        .unwrap();
        let rendered: Vec<String> = structures.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            rendered,
            ["0: B <-> A | 1: X <-> Y", "0: A <-> B | 1: X <-> Y"]
        );
    }

    #[test]
    fn test_empty_level() {
        let hierarchy = FactorHierarchy::from_levels(vec![factors(&["A"])]).unwrap();
        let structures =
            find_structures(&[vec![]], &hierarchy, StructureMode::Simple, AssemblyLimits::default())
                .unwrap();
        assert_eq!(structures, vec![CandidateStructure::new(vec![vec![]])]);
    }
}
