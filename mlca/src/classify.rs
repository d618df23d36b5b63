// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{formula::Equivalence, hierarchy::FactorHierarchy};
use serde::Serialize;
use tracing::debug;

/// Relations sorted into causal relations per level and constitution relations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClassifiedRelations {
    /// Relations among the factors of one level, indexed by level.
    pub causal: Vec<Vec<Equivalence>>,
    /// Relations whose antecedent lies on the level directly below the consequent.
    pub constitution: Vec<Equivalence>,
}

impl ClassifiedRelations {
    pub fn is_empty(&self) -> bool {
        self.constitution.is_empty() && self.causal.iter().all(Vec::is_empty)
    }
}

pub fn classify(relations: &[Equivalence], hierarchy: &FactorHierarchy) -> ClassifiedRelations {
    let mut classified = ClassifiedRelations {
        causal: vec![Vec::new(); hierarchy.level_count()],
        constitution: Vec::new(),
    };

    for relation in relations {
        let effect_level = hierarchy.level_of(relation.consequent());
        let cause_level = hierarchy.formula_level(relation.antecedent());
        match (cause_level, effect_level) {
            (Some(cause), Some(effect)) if cause == effect => {
                classified.causal[effect].push(relation.clone());
            }
            (Some(cause), Some(effect)) if cause + 1 == effect => {
                classified.constitution.push(relation.clone());
            }
            _ => debug!(relation = %relation, "discarded relation spanning unrelated levels"),
        }
    }

    for level in &mut classified.causal {
        level.sort();
        level.dedup();
    }
    classified.constitution.sort();
    classified.constitution.dedup();
    classified
}
