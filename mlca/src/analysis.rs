// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The full pipeline from a data table to causal models.

use crate::{
    assembler::{
        combine_levels, find_structures, remove_fragments, CandidateStructure, CausalModel,
    },
    classify::{classify, ClassifiedRelations},
    config::{AnalysisConfig, Strategy},
    errors::ModelError,
    factor::Factor,
    formula::Equivalence,
    hierarchy::{FactorHierarchy, FactorSet},
    minimizer,
    ordering::{reduce_structural_redundancy, Reduction},
    suspension,
    table::DataTable,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Everything an analysis found.
#[derive(Clone, Debug, Serialize)]
pub struct AnalysisReport {
    /// Relations derived from the data, or given as input.
    pub relations: Vec<Equivalence>,
    pub classified: ClassifiedRelations,
    /// Complete, acyclic models without fragments.
    pub models: Vec<CausalModel>,
    /// Structures with a level whose circularity couldn't be reduced.
    pub unresolved: Vec<CandidateStructure>,
}

/// Runs analyses over a fixed factor hierarchy.
#[derive(Clone, Debug)]
pub struct Analysis {
    hierarchy: FactorHierarchy,
    config: AnalysisConfig,
}

impl Analysis {
    pub fn new(hierarchy: FactorHierarchy, config: AnalysisConfig) -> Self {
        Self { hierarchy, config }
    }

    #[inline]
    pub fn hierarchy(&self) -> &FactorHierarchy {
        &self.hierarchy
    }

    #[inline]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Derives relations from `table` with the configured strategy.
    ///
    /// Every factor of the hierarchy needs a column; other columns are ignored.
    pub fn derive_relations(&self, table: &DataTable) -> Result<Vec<Equivalence>, ModelError> {
        if let Some(factor) = self.hierarchy.factors().find(|f| !table.contains(f)) {
            return Err(ModelError::MissingColumn {
                factor: factor.clone(),
            });
        }
        let factors: Vec<Factor> = self.hierarchy.factors().cloned().collect();
        let table = table.project(&factors);
        info!(
            factors = factors.len(),
            rows = table.row_count(),
            strategy = ?self.config.strategy,
            "deriving relations"
        );

        let relations = match self.config.strategy {
            Strategy::TopDown => minimizer::derive_relations(&table, &self.hierarchy),
            Strategy::BottomUp => {
                suspension::derive_relations(&table, &self.hierarchy, &self.config.suspension)
            }
        };
        info!(relations = relations.len(), "derived relations");
        Ok(relations)
    }

    pub fn run(&self, table: &DataTable) -> Result<AnalysisReport, ModelError> {
        let relations = self.derive_relations(table)?;
        self.assemble(relations)
    }

    /// Assembles models from already known relations.
    pub fn assemble(&self, relations: Vec<Equivalence>) -> Result<AnalysisReport, ModelError> {
        let classified = classify(&relations, &self.hierarchy);
        let structures = find_structures(
            &classified.causal,
            &self.hierarchy,
            self.config.structure_mode,
            self.config.assembly_limits(),
        )?;

        let mut reduced = Vec::new();
        let mut unresolved = Vec::new();
        for structure in &structures {
            match self.reduce(structure)? {
                Some(alternatives) => reduced.extend(alternatives),
                None => unresolved.push(structure.clone()),
            }
        }

        let candidates = remove_fragments(reduced);
        let candidate_count = candidates.len();
        let models: Vec<CausalModel> = candidates
            .into_iter()
            .filter(|structure| !structure.violates_order(&self.hierarchy))
            .map(|structure| {
                CausalModel::new(&structure, &self.hierarchy, &classified.constitution)
            })
            .collect();
        if models.len() < candidate_count {
            debug!(
                rejected = candidate_count - models.len(),
                "rejected models contradicting the causal order"
            );
        }
        info!(
            models = models.len(),
            unresolved = unresolved.len(),
            "finished analysis"
        );

        Ok(AnalysisReport {
            relations,
            classified,
            models,
            unresolved,
        })
    }

    /// Reduces every circular level of `structure`. Returns `None` if some level can't be
    /// reduced.
    fn reduce(
        &self,
        structure: &CandidateStructure,
    ) -> Result<Option<Vec<CandidateStructure>>, ModelError> {
        let mut per_level = Vec::with_capacity(structure.levels().len());
        for (level, relations) in structure.levels().iter().enumerate() {
            let factors = FactorSet::Flat(self.hierarchy.level_factors(level));
            match reduce_structural_redundancy(
                relations,
                &factors,
                self.config.max_enumerated_factors,
            )? {
                Reduction::Reduced(alternatives) => per_level.push(alternatives),
                Reduction::Unresolvable(_) => {
                    warn!(level, structure = %structure, "circularity can't be reduced");
                    return Ok(None);
                }
            }
        }
        Ok(Some(combine_levels(per_level)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cluster::Clusters,
        config::{Strategy, StructureMode},
        proptest_helpers::arb_table,
    };
    use proptest::{prelude::*, test_runner::TestCaseError};
    use std::collections::BTreeSet;

    fn factors(names: &[&str]) -> Vec<Factor> {
        names.iter().map(|n| Factor::new(n).unwrap()).collect()
    }

    fn relations(specs: &[&str]) -> Vec<Equivalence> {
        specs.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn model_relations(report: &AnalysisReport) -> Vec<Vec<String>> {
        report
            .models
            .iter()
            .map(|m| m.relations().map(|r| r.to_string()).collect())
            .collect()
    }

    fn conjunction_table() -> DataTable {
        DataTable::parse_rows(&["A", "B", "C"], &["111", "100", "010", "000"]).unwrap()
    }

    #[test]
    fn test_conjunction_both_strategies() {
        let hierarchy = FactorHierarchy::flat(factors(&["A", "B", "C"])).unwrap();
        for strategy in [Strategy::TopDown, Strategy::BottomUp] {
            let config = AnalysisConfig {
                strategy,
                ..AnalysisConfig::default()
            };
            let report = Analysis::new(hierarchy.clone(), config)
                .run(&conjunction_table())
                .unwrap();
            assert_eq!(model_relations(&report), [vec!["A*B <-> C"]], "{:?}", strategy);
            assert!(report.unresolved.is_empty());
        }
    }

    #[test]
    fn test_mutual_causation() {
        let analysis = Analysis::new(
            FactorHierarchy::flat(factors(&["A", "B"])).unwrap(),
            AnalysisConfig::default(),
        );
        let report = analysis.assemble(relations(&["A <-> B", "B <-> A"])).unwrap();
        assert_eq!(model_relations(&report), [vec!["B <-> A"], vec!["A <-> B"]]);
    }

    #[test]
    fn test_competing_causes_simple_mode() {
        let analysis = Analysis::new(
            FactorHierarchy::flat(factors(&["A", "B", "C"])).unwrap(),
            AnalysisConfig {
                structure_mode: StructureMode::Simple,
                ..AnalysisConfig::default()
            },
        );
        let report = analysis.assemble(relations(&["A <-> C", "B <-> C"])).unwrap();
        assert_eq!(model_relations(&report), [vec!["A <-> C"], vec!["B <-> C"]]);
    }

    #[test]
    fn test_causal_order_respected() {
        let hierarchy =
            FactorHierarchy::new(vec![vec![factors(&["A"]), factors(&["B"])]]).unwrap();
        let analysis = Analysis::new(hierarchy, AnalysisConfig::default());
        let report = analysis.assemble(relations(&["A <-> B", "B <-> A"])).unwrap();
        assert_eq!(model_relations(&report), [vec!["A <-> B"]]);
    }

    #[test]
    fn test_constitution() {
        let hierarchy =
            FactorHierarchy::from_levels(vec![factors(&["A", "B", "C"]), factors(&["X"])])
                .unwrap();
        let analysis = Analysis::new(hierarchy, AnalysisConfig::default());
        let report = analysis
            .assemble(relations(&["A*B <-> C", "A + C <-> X"]))
            .unwrap();
        assert_eq!(report.models.len(), 1);
        assert_eq!(report.models[0].constitution, relations(&["A + C <-> X"]));
        assert_eq!(report.models[0].levels.len(), 2);
    }

    #[test]
    fn test_missing_column() {
        let analysis = Analysis::new(
            FactorHierarchy::flat(factors(&["A", "B", "C", "D"])).unwrap(),
            AnalysisConfig::default(),
        );
        assert!(matches!(
            analysis.run(&conjunction_table()),
            Err(ModelError::MissingColumn { factor }) if factor.name() == "D"
        ));
    }

    #[test]
    fn test_empty_input() {
        let analysis = Analysis::new(
            FactorHierarchy::flat(factors(&["A", "B"])).unwrap(),
            AnalysisConfig::default(),
        );
        let report = analysis.assemble(Vec::new()).unwrap();
        assert_eq!(report.models.len(), 1);
        assert_eq!(report.models[0].relations().count(), 0);
    }

    /// Whether every level of `model` is contained in the same level of `other`.
    fn is_fragment(model: &CausalModel, other: &CausalModel) -> bool {
        model
            .levels
            .iter()
            .zip(&other.levels)
            .all(|(level, other)| level.relations.iter().all(|r| other.relations.contains(r)))
    }

    /// Checks that the models of `report` are sound, acyclic and complete, and that none of them
    /// is a fragment of another.
    fn check_models(
        table: &DataTable,
        hierarchy: &FactorHierarchy,
        report: &AnalysisReport,
    ) -> Result<(), TestCaseError> {
        for model in &report.models {
            prop_assert!(model.is_acyclic());
            prop_assert_eq!(model.levels.len(), hierarchy.level_count());
            for relation in model.relations().chain(&model.constitution) {
                prop_assert!(table.holds(relation), "{} must hold", relation);
            }

            for (level, relations) in report.classified.causal.iter().enumerate() {
                let mentioned: BTreeSet<Factor> = model.levels[level]
                    .relations
                    .iter()
                    .flat_map(Equivalence::factors)
                    .collect();
                let level_factors = FactorSet::Flat(hierarchy.level_factors(level));
                for group in Clusters::new(relations, &level_factors).groups() {
                    let cluster: Vec<&Equivalence> = relations
                        .iter()
                        .filter(|r| group.contains(r.consequent()))
                        .collect();
                    // A cluster explaining a single effect needs only one of its causes.
                    let effects: BTreeSet<&Factor> =
                        cluster.iter().map(|r| r.consequent()).collect();
                    if effects.len() <= 1 {
                        continue;
                    }
                    for factor in cluster.iter().flat_map(|r| r.factors()) {
                        prop_assert!(
                            mentioned.contains(&factor),
                            "level {} of a model lacks {}",
                            level,
                            factor
                        );
                    }
                }
            }
        }

        for (ix, model) in report.models.iter().enumerate() {
            for (other_ix, other) in report.models.iter().enumerate() {
                prop_assert!(
                    ix == other_ix || !is_fragment(model, other),
                    "model {} is a fragment of model {}",
                    ix,
                    other_ix
                );
            }
        }
        Ok(())
    }

    /// Runs the analysis in both structure modes. Complex mode may give up on tables whose
    /// circular groups have too many composite variants.
    fn check_both_modes(
        table: &DataTable,
        hierarchy: &FactorHierarchy,
    ) -> Result<(), TestCaseError> {
        for structure_mode in [StructureMode::Simple, StructureMode::Complex] {
            let config = AnalysisConfig {
                structure_mode,
                max_resolutions: 500,
                ..AnalysisConfig::default()
            };
            match Analysis::new(hierarchy.clone(), config).run(table) {
                Ok(report) => check_models(table, hierarchy, &report)?,
                Err(ModelError::TooManyResolutions { .. })
                    if structure_mode == StructureMode::Complex => {}
                Err(error) => {
                    return Err(TestCaseError::fail(format!(
                        "{:?}: {}",
                        structure_mode, error
                    )))
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_resolution_limit_propagates() {
        let mutual = relations(&[
            "A <-> B", "B <-> A", "A <-> C", "C <-> A", "B <-> C", "C <-> B",
        ]);
        let hierarchy = FactorHierarchy::flat(factors(&["A", "B", "C"])).unwrap();
        let config = AnalysisConfig {
            structure_mode: StructureMode::Simple,
            max_resolutions: 10,
            ..AnalysisConfig::default()
        };
        let report = Analysis::new(hierarchy.clone(), config.clone())
            .assemble(mutual.clone())
            .unwrap();
        assert_eq!(report.models.len(), 9);

        let config = AnalysisConfig {
            structure_mode: StructureMode::Complex,
            ..config
        };
        assert!(matches!(
            Analysis::new(hierarchy, config).assemble(mutual),
            Err(ModelError::TooManyResolutions { limit: 10 })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn proptest_models_are_sound_and_complete(table in arb_table(4, 10)) {
            let hierarchy = FactorHierarchy::flat(table.factors().to_vec()).unwrap();
            check_both_modes(&table, &hierarchy)?;
        }

        #[test]
        fn proptest_two_level_models_are_sound_and_complete(table in arb_table(4, 10)) {
            let hierarchy =
                FactorHierarchy::from_levels(vec![factors(&["A", "B"]), factors(&["C", "D"])])
                    .unwrap();
            check_both_modes(&table, &hierarchy)?;
        }
    }
}
