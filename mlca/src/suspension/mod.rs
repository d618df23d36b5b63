// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic derivation of relations through a breadth-first search with suspension.
//!
//! Effects are searched layer by layer on every level. Each search tree starts from the literals
//! of the factors on the target's level and the level below, and grows by conjoining and
//! disjoining nodes on the same level. Nodes that don't improve on their parents are suspended
//! and only revisited if nothing was found.

mod node;
mod search;

pub use node::*;
pub use search::*;

use crate::{
    coextensive::CoextensiveSets,
    config::SuspensionConfig,
    factor::Factor,
    formula::Equivalence,
    hierarchy::FactorHierarchy,
    table::DataTable,
};
use rayon::prelude::*;
use tracing::{debug, info};

/// A group of effects searched together on one level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    pub level: usize,
    pub effects: Vec<Factor>,
    /// Factors whose literals start out active; `None` leaves every candidate active.
    pub causes: Option<Vec<Factor>>,
}

/// Splits the effects of every level into layers.
///
/// The first layer of a level contains its possible effects, with the level's other factors
/// (and those of the level below) as causes. Every following layer contains the effects among
/// the previous layer's effects, with all other factors as causes.
pub fn layers(table: &DataTable, hierarchy: &FactorHierarchy) -> Vec<Layer> {
    let mut layers = Vec::new();

    for level in 0..hierarchy.level_count() {
        let level_factors: Vec<Factor> = hierarchy
            .level_factors(level)
            .into_iter()
            .filter(|f| table.contains(f))
            .collect();
        let lower: Vec<Factor> = level
            .checked_sub(1)
            .map(|l| hierarchy.level_factors(l))
            .unwrap_or_default()
            .into_iter()
            .filter(|f| table.contains(f))
            .collect();
        let with_lower = |causes: &[Factor]| -> Vec<Factor> {
            lower.iter().chain(causes).cloned().collect()
        };

        if level_factors.len() == 1 {
            layers.push(Layer {
                level,
                effects: level_factors,
                causes: None,
            });
            continue;
        }

        let mut effects = table.project(&level_factors).find_effects(&level_factors);
        let mut causes: Vec<Factor> = level_factors
            .iter()
            .filter(|f| !effects.contains(f))
            .cloned()
            .collect();
        if causes.is_empty() {
            layers.push(Layer {
                level,
                causes: Some(with_lower(&level_factors)),
                effects,
            });
            continue;
        }

        while !effects.is_empty() {
            layers.push(Layer {
                level,
                effects: effects.clone(),
                causes: Some(with_lower(&causes)),
            });
            let next = table.project(&effects).find_effects(&effects);
            if next.is_empty() || next.len() == effects.len() {
                break;
            }
            causes = level_factors
                .iter()
                .filter(|f| !next.contains(f))
                .cloned()
                .collect();
            effects = next;
        }
    }

    layers
}

/// Searches antecedents for one target among the factors on its level and the level below.
pub fn search_target(
    table: &DataTable,
    hierarchy: &FactorHierarchy,
    target: &Factor,
    causes: Option<&[Factor]>,
    config: &SuspensionConfig,
) -> SearchOutcome {
    let level = match hierarchy.level_of(target) {
        Some(level) => level,
        None => return SearchOutcome::Exhausted,
    };
    let candidates: Vec<(Factor, usize)> = level
        .checked_sub(1)
        .into_iter()
        .chain(std::iter::once(level))
        .flat_map(|l| {
            hierarchy
                .level_factors(l)
                .into_iter()
                .map(move |factor| (factor, l))
        })
        .filter(|(factor, _)| factor != target && table.contains(factor))
        .collect();

    let positives = table.column(target).map_or(0, |column| column.count_ones());
    let limits = SearchLimits {
        node_budget: config.node_budget,
        suspension_accuracy: config.suspension_accuracy,
        quality_threshold: config.quality_threshold,
        max_relaxations: config.max_relaxations,
        max_disjuncts: config
            .max_disjuncts
            .unwrap_or_else(|| positives.min(table.row_count()))
            .max(1),
        max_conjuncts: config.max_conjuncts.unwrap_or(candidates.len()).max(1),
    };

    let search = SuspensionSearch::new(table, target.clone(), candidates, limits);
    match causes {
        Some(causes) => search.with_active_causes(causes.iter().cloned()),
        None => search,
    }
    .run()
}

/// Derives relations for the factors of `hierarchy` by searching every layer's effects.
///
/// Of every group of co-extensive factors only one representative per level takes part in the
/// search; the other members get their relations afterwards.
pub fn derive_relations(
    table: &DataTable,
    hierarchy: &FactorHierarchy,
    config: &SuspensionConfig,
) -> Vec<Equivalence> {
    let factors: Vec<Factor> = hierarchy
        .factors()
        .filter(|f| table.contains(f))
        .cloned()
        .collect();
    let coextensive = CoextensiveSets::detect(table, hierarchy, &factors);
    let redundant = coextensive.redundant_members();
    let reduced = hierarchy.without(&redundant);

    let targets: Vec<(Factor, Option<Vec<Factor>>)> = layers(table, &reduced)
        .into_iter()
        .flat_map(|layer| {
            let causes = layer.causes;
            layer
                .effects
                .into_iter()
                .map(move |effect| (effect, causes.clone()))
        })
        .collect();
    info!(
        factors = factors.len(),
        redundant = redundant.len(),
        targets = targets.len(),
        "searching effects"
    );

    let relations: Vec<Equivalence> = targets
        .par_iter()
        .flat_map_iter(|(target, causes)| {
            let outcome = search_target(table, &reduced, target, causes.as_deref(), config);
            let formulas = match outcome {
                SearchOutcome::Found(formulas) => formulas,
                SearchOutcome::BestEffort(formulas) if config.accept_best_effort => formulas,
                SearchOutcome::BestEffort(formulas) => {
                    debug!(
                        effect = %target,
                        candidates = formulas.len(),
                        "ignoring best-effort results"
                    );
                    Vec::new()
                }
                SearchOutcome::Exhausted => {
                    debug!(effect = %target, "no antecedents found");
                    Vec::new()
                }
            };
            formulas
                .into_iter()
                .filter_map(move |formula| Equivalence::new(formula, target.clone()).ok())
        })
        .collect();

    coextensive.expand_bottom_up(&relations, hierarchy)
}
