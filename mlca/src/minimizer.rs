// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exhaustive derivation of relations through prime implicants and Petrick's method.

use crate::{
    coextensive::CoextensiveSets,
    factor::Factor,
    formula::{Dnf, Equivalence},
    hierarchy::FactorHierarchy,
    logic_function::InstanceFunction,
    table::DataTable,
};
use rayon::prelude::*;
use tracing::{debug, info};

/// Returns every minimal antecedent for `target`, or nothing if the target's instance function is
/// degenerate.
pub fn minimal_antecedents(
    table: &DataTable,
    hierarchy: &FactorHierarchy,
    target: &Factor,
) -> Vec<Dnf> {
    let function = InstanceFunction::new(table, hierarchy, target);
    if function.is_degenerate() {
        info!(effect = %target, "instance function is degenerate, treating as non-effect");
        return Vec::new();
    }
    function.minimize()
}

/// Derives every relation the data implies for the factors of `hierarchy`.
///
/// Only possible effects are minimized, and of every group of co-extensive effects only one
/// representative per level; the other members get their relations by substitution. Relations
/// that don't hold on every row are dropped.
pub fn derive_relations(table: &DataTable, hierarchy: &FactorHierarchy) -> Vec<Equivalence> {
    let factors: Vec<Factor> = hierarchy
        .factors()
        .filter(|f| table.contains(f))
        .cloned()
        .collect();
    let effects = table.find_effects(&factors);
    let coextensive = CoextensiveSets::detect(table, hierarchy, &effects);
    let redundant = coextensive.redundant_members();
    let targets: Vec<&Factor> = effects.iter().filter(|f| !redundant.contains(*f)).collect();
    info!(
        factors = factors.len(),
        effects = effects.len(),
        targets = targets.len(),
        "minimizing effects"
    );

    let relations: Vec<Equivalence> = targets
        .par_iter()
        .flat_map_iter(|&target| {
            minimal_antecedents(table, hierarchy, target)
                .into_iter()
                .filter_map(move |antecedent| Equivalence::new(antecedent, target.clone()).ok())
        })
        .collect();

    coextensive
        .expand_top_down(&relations, hierarchy)
        .into_iter()
        .filter(|relation| {
            let holds = table.holds(relation);
            if !holds {
                debug!(relation = %relation, "dropped relation violated by the data");
            }
            holds
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proptest_helpers::arb_table;
    use proptest::prelude::*;

    fn flat(names: &[&str]) -> FactorHierarchy {
        FactorHierarchy::flat(names.iter().map(|n| Factor::new(n).unwrap()).collect()).unwrap()
    }

    fn rendered(relations: &[Equivalence]) -> Vec<String> {
        relations.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_conjunction_scenario() {
        let table =
            DataTable::parse_rows(&["A", "B", "C"], &["111", "100", "010", "000"]).unwrap();
        let relations = derive_relations(&table, &flat(&["A", "B", "C"]));
        assert_eq!(rendered(&relations), ["A*B <-> C"]);
    }

    #[test]
    fn test_coextensive_effects() {
        // C and D share a column; only C is minimized.
        let table = DataTable::parse_rows(
            &["A", "B", "C", "D"],
            &["1111", "1000", "0100", "0000"],
        )
        .unwrap();
        let relations = derive_relations(&table, &flat(&["A", "B", "C", "D"]));
        assert_eq!(
            rendered(&relations),
            ["A*B <-> C", "D <-> C", "A*B <-> D", "C <-> D"]
        );
    }

    #[test]
    fn test_degenerate_target() {
        let table = DataTable::parse_rows(&["A", "B"], &["11", "01"]).unwrap();
        let hierarchy = flat(&["A", "B"]);
        assert!(minimal_antecedents(&table, &hierarchy, &Factor::new("B").unwrap()).is_empty());
        assert!(derive_relations(&table, &hierarchy).is_empty());
    }

    #[test]
    fn test_constitution_relation() {
        // X on the upper level is constituted by A + B.
        let table = DataTable::parse_rows(
            &["A", "B", "X"],
            &["111", "101", "011", "000"],
        )
        .unwrap();
        let hierarchy = FactorHierarchy::from_levels(vec![
            vec![Factor::new("A").unwrap(), Factor::new("B").unwrap()],
            vec![Factor::new("X").unwrap()],
        ])
        .unwrap();
        let relations = derive_relations(&table, &hierarchy);
        assert_eq!(rendered(&relations), ["A + B <-> X"]);
    }

    proptest! {
        #[test]
        fn proptest_derived_relations_hold(table in arb_table(4, 12)) {
            let hierarchy = FactorHierarchy::flat(table.factors().to_vec()).unwrap();
            for relation in derive_relations(&table, &hierarchy) {
                prop_assert!(table.holds(&relation), "{} must hold on every row", relation);
            }
        }

        #[test]
        fn proptest_antecedents_are_minimal(table in arb_table(4, 12)) {
            let hierarchy = FactorHierarchy::flat(table.factors().to_vec()).unwrap();
            for target in table.factors() {
                let antecedents = minimal_antecedents(&table, &hierarchy, target);
                for a in &antecedents {
                    for b in &antecedents {
                        let (a_factors, b_factors) = (a.factors(), b.factors());
                        prop_assert!(
                            !(a_factors.is_superset(&b_factors) && a_factors != b_factors),
                            "{} must not subsume {}", a, b
                        );
                    }
                }
            }
        }
    }
}
