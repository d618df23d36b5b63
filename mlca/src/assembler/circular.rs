// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::complex::composite_variants;
use crate::{
    cluster::Clusters,
    config::{AssemblyLimits, StructureMode},
    errors::ModelError,
    factor::{Factor, Literal},
    formula::{Conjunction, Dnf, Equivalence},
    hierarchy::FactorSet,
    ordering::is_transitive,
};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

/// Returns the relations `l <-> Y` with a single-literal antecedent for which the mirrored
/// relation with the same polarity (`Y <-> X` or `~Y <-> X` for `l = ~X`) exists too.
pub fn circular_relations(relations: &[Equivalence]) -> Vec<Equivalence> {
    relations
        .iter()
        .filter(|relation| {
            let cause = match relation.single_cause() {
                Some(cause) => cause,
                None => return false,
            };
            relations.iter().any(|other| {
                other.single_cause().map_or(false, |other_cause| {
                    other_cause.factor() == relation.consequent()
                        && other.consequent() == cause.factor()
                        && other_cause.is_negated() == cause.is_negated()
                })
            })
        })
        .cloned()
        .collect()
}

/// Enumerates the subsets of `circular` that resolve its circularity.
///
/// A subset is kept if it is acyclic, has at most one relation per consequent, mentions every
/// factor of `circular` and connects the same clusters. In complex mode several relations for one
/// consequent are merged into a conjunction of their causes instead of rejecting the subset, and
/// every resolution with such a composite also yields its junctor variants.
///
/// Returns resolutions sorted and without duplicates. An empty `circular` has exactly one, empty,
/// resolution.
///
/// Fails if `circular` is larger than the configured limit (which is capped so that every subset
/// has a 64-bit mask), or if there are more than `max_resolutions` resolutions.
pub fn resolve_circular(
    circular: &[Equivalence],
    mode: StructureMode,
    limits: AssemblyLimits,
) -> Result<Vec<Vec<Equivalence>>, ModelError> {
    let limit = limits.max_circular_relations.min(u64::BITS as usize - 1);
    if circular.len() > limit {
        return Err(ModelError::SearchSpaceTooLarge {
            count: circular.len(),
            limit,
        });
    }

    let factors: BTreeSet<Factor> = circular.iter().flat_map(Equivalence::factors).collect();
    let factors = FactorSet::Flat(factors.into_iter().collect());
    let clusters = Clusters::new(circular, &factors);

    let mut resolutions: BTreeSet<Vec<Equivalence>> = (0..1_u64 << circular.len())
        .into_par_iter()
        .filter_map(|mask| {
            let subset: Vec<Equivalence> = circular
                .iter()
                .enumerate()
                .filter(|&(ix, _)| (mask >> ix) & 1 == 1)
                .map(|(_, relation)| relation.clone())
                .collect();
            resolve_subset(subset, &factors, &clusters, mode)
        })
        .collect();

    let too_many = ModelError::TooManyResolutions {
        limit: limits.max_resolutions,
    };
    if resolutions.len() > limits.max_resolutions {
        return Err(too_many);
    }

    if mode == StructureMode::Complex {
        let mut variants: Vec<Vec<Equivalence>> = Vec::new();
        for resolution in &resolutions {
            let budget = limits
                .max_resolutions
                .saturating_sub(resolutions.len() + variants.len());
            match resolution_variants(resolution, budget) {
                Some(extra) => variants.extend(extra),
                None => {
                    debug!(
                        circular = circular.len(),
                        limit = limits.max_resolutions,
                        "too many composite variants"
                    );
                    return Err(too_many);
                }
            }
        }
        resolutions.extend(variants);
    }

    debug!(
        circular = circular.len(),
        resolutions = resolutions.len(),
        "resolved circular relations"
    );
    Ok(resolutions.into_iter().collect())
}

fn resolve_subset(
    subset: Vec<Equivalence>,
    factors: &FactorSet,
    clusters: &Clusters,
    mode: StructureMode,
) -> Option<Vec<Equivalence>> {
    if !is_transitive(&subset, factors) {
        return None;
    }

    let mut causes: BTreeMap<Factor, Vec<Literal>> = BTreeMap::new();
    for relation in &subset {
        let cause = relation.single_cause()?;
        causes
            .entry(relation.consequent().clone())
            .or_default()
            .push(cause.clone());
    }

    let mut resolved: Vec<Equivalence> = Vec::with_capacity(subset.len());
    for (effect, effect_causes) in causes {
        if effect_causes.len() == 1 {
            resolved.extend(
                subset
                    .iter()
                    .filter(|relation| *relation.consequent() == effect)
                    .cloned(),
            );
            continue;
        }
        match mode {
            StructureMode::Simple => return None,
            StructureMode::Complex => {
                let composite = Conjunction::new(effect_causes).ok()?;
                resolved.push(Equivalence::new(Dnf::new([composite]), effect).ok()?);
            }
        }
    }

    let mentioned: BTreeSet<Factor> = resolved.iter().flat_map(Equivalence::factors).collect();
    if factors.iter().any(|factor| !mentioned.contains(factor)) {
        trace!(relations = resolved.len(), "incomplete resolution");
        return None;
    }
    if Clusters::new(&resolved, factors) != *clusters {
        trace!(relations = resolved.len(), "resolution disconnects factors");
        return None;
    }

    resolved.sort();
    Some(resolved)
}

/// Every combination of composite variants in `resolution`, together with its other relations.
///
/// Returns `None` if there would be more than `limit` combinations.
fn resolution_variants(
    resolution: &[Equivalence],
    limit: usize,
) -> Option<Vec<Vec<Equivalence>>> {
    let (composites, base): (Vec<&Equivalence>, Vec<&Equivalence>) = resolution
        .iter()
        .partition(|relation| relation.antecedent().literal_count() > 1);
    if composites.is_empty() {
        return Some(Vec::new());
    }

    let mut variants: Vec<Vec<Equivalence>> = vec![base.into_iter().cloned().collect()];
    for composite in composites {
        let formulas = match composite.antecedent().as_conjunction() {
            Some(conjunction) => composite_variants(conjunction, limit)?,
            None => vec![composite.antecedent().clone()],
        };
        if variants.len().checked_mul(formulas.len())? > limit {
            return None;
        }
        variants = variants
            .into_iter()
            .flat_map(|partial| {
                formulas.iter().filter_map(move |formula| {
                    let relation =
                        Equivalence::new(formula.clone(), composite.consequent().clone()).ok()?;
                    let mut extended = partial.clone();
                    extended.push(relation);
                    Some(extended)
                })
            })
            .collect();
    }

    for variant in &mut variants {
        variant.sort();
    }
    Some(variants)
}
