// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use mlca::{
    analysis::{Analysis, AnalysisReport},
    config::AnalysisConfig,
    errors::ModelError,
    factor::{Factor, Literal},
    formula::{Conjunction, Dnf, Equivalence},
    hierarchy::FactorHierarchy,
    table::DataTable,
};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};

/// A factor hierarchy together with either observed data or known relations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub name: String,
    pub hierarchy: FactorHierarchy,
    /// The relations the table was generated from, or the relations to assemble if there is no
    /// table.
    #[serde(default)]
    pub relations: Vec<Equivalence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<DataTable>,
}

impl Fixture {
    pub fn from_relations(
        name: impl Into<String>,
        hierarchy: FactorHierarchy,
        relations: Vec<Equivalence>,
    ) -> Self {
        Self {
            name: name.into(),
            hierarchy,
            relations,
            table: None,
        }
    }

    pub fn from_table(
        name: impl Into<String>,
        hierarchy: FactorHierarchy,
        table: DataTable,
    ) -> Self {
        Self {
            name: name.into(),
            hierarchy,
            relations: Vec::new(),
            table: Some(table),
        }
    }

    /// Derives relations from the table if there is one, and assembles models from them.
    pub fn analyze(&self, config: AnalysisConfig) -> Result<AnalysisReport, ModelError> {
        let analysis = Analysis::new(self.hierarchy.clone(), config);
        match &self.table {
            Some(table) => analysis.run(table),
            None => analysis.assemble(self.relations.clone()),
        }
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

/// Small scenarios with known outcomes.
pub fn known_fixtures() -> Vec<Fixture> {
    vec![
        Fixture::from_table(
            "conjunction",
            FactorHierarchy::flat(factors(&["A", "B", "C"])).expect("names are distinct"),
            table(&["A", "B", "C"], &["111", "100", "010", "000"]),
        ),
        Fixture::from_table(
            "constitution",
            FactorHierarchy::from_levels(vec![factors(&["A", "B"]), factors(&["X"])])
                .expect("names are distinct"),
            table(&["A", "B", "X"], &["111", "101", "011", "000"]),
        ),
        Fixture::from_relations(
            "mutual-causation",
            FactorHierarchy::flat(factors(&["A", "B"])).expect("names are distinct"),
            relations(&["A <-> B", "B <-> A"]),
        ),
        Fixture::from_relations(
            "competing-causes",
            FactorHierarchy::flat(factors(&["A", "B", "C"])).expect("names are distinct"),
            relations(&["A <-> C", "B <-> C"]),
        ),
        Fixture::from_relations(
            "ordered-mutual-causation",
            FactorHierarchy::new(vec![vec![factors(&["A"]), factors(&["B"])]])
                .expect("names are distinct"),
            relations(&["A <-> B", "B <-> A"]),
        ),
    ]
}

/// A random causal chain over `exogenous` root factors followed by `endogenous` effects.
///
/// Every effect gets a random antecedent over the factors before it. The table holds one row per
/// configuration of the root factors.
pub fn arb_fixture(
    name: impl Into<String>,
    exogenous: usize,
    endogenous: usize,
) -> impl Strategy<Value = Fixture> {
    let exogenous = exogenous.max(1);
    let all: Vec<Factor> = (0..exogenous + endogenous).map(nth_factor).collect();
    let antecedents: Vec<BoxedStrategy<Dnf>> = (exogenous..all.len())
        .map(|ix| arb_antecedent(all[..ix].to_vec()))
        .collect();
    let name = name.into();

    antecedents.prop_map(move |antecedents| {
        let relations: Vec<Equivalence> = antecedents
            .into_iter()
            .zip(&all[exogenous..])
            .map(|(antecedent, effect)| {
                Equivalence::new(antecedent, effect.clone())
                    .expect("antecedents only mention earlier factors")
            })
            .collect();
        let table = truth_table(&all, exogenous, &relations);
        Fixture {
            name: name.clone(),
            hierarchy: FactorHierarchy::flat(all.clone()).expect("names are distinct"),
            relations,
            table: Some(table),
        }
    })
}

fn arb_antecedent(available: Vec<Factor>) -> BoxedStrategy<Dnf> {
    let max_literals = available.len().min(2);
    let disjunct = (
        prop::sample::subsequence(available, 1..=max_literals),
        prop::collection::vec(any::<bool>(), max_literals),
    )
        .prop_map(|(factors, negations)| {
            let literals = factors
                .into_iter()
                .zip(negations)
                .map(|(factor, negated)| Literal::new(factor, negated));
            Conjunction::new(literals).expect("literals are over distinct factors")
        });
    prop::collection::vec(disjunct, 1..=2)
        .prop_map(Dnf::new)
        .boxed()
}

/// Evaluates `relations` in order on every configuration of the first `exogenous` factors.
fn truth_table(all: &[Factor], exogenous: usize, relations: &[Equivalence]) -> DataTable {
    let rows = (0..1_usize << exogenous).map(|config| {
        let mut values: Vec<bool> = (0..exogenous)
            .map(|ix| (config >> (exogenous - 1 - ix)) & 1 == 1)
            .collect();
        for relation in relations {
            let value = relation.antecedent().evaluate(|factor| {
                all.iter()
                    .position(|f| f == factor)
                    .map_or(false, |ix| values[ix])
            });
            values.push(value);
        }
        values
    });
    DataTable::from_rows(all.to_vec(), rows).expect("rows have one value per factor")
}

fn nth_factor(ix: usize) -> Factor {
    let name = char::from(b'A' + (ix % 26) as u8).to_string();
    let name = if ix < 26 { name } else { format!("{}{}", name, ix / 26) };
    Factor::new(name).expect("generated names are valid")
}

fn factors(names: &[&str]) -> Vec<Factor> {
    names
        .iter()
        .map(|name| Factor::new(name).expect("fixture names are valid"))
        .collect()
}

fn relations(specs: &[&str]) -> Vec<Equivalence> {
    specs
        .iter()
        .map(|spec| spec.parse().expect("fixture relations are valid"))
        .collect()
}

fn table(names: &[&str], rows: &[&str]) -> DataTable {
    DataTable::parse_rows(names, rows).expect("fixture tables are valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValueGenerator;
    use proptest::test_runner::TestCaseError;
    use mlca::{
        assembler::CausalModel,
        config::{Strategy as DerivationStrategy, StructureMode},
    };

    fn known(name: &str) -> Fixture {
        known_fixtures()
            .into_iter()
            .find(|f| f.name == name)
            .unwrap()
    }

    /// Whether every level of `inner` is contained in the same level of `outer`.
    fn contains_levels(outer: &CausalModel, inner: &CausalModel) -> bool {
        inner
            .levels
            .iter()
            .zip(&outer.levels)
            .all(|(inner, outer)| inner.relations.iter().all(|r| outer.relations.contains(r)))
    }

    fn model_relations(report: &AnalysisReport) -> Vec<Vec<String>> {
        report
            .models
            .iter()
            .map(|m| m.relations().map(|r| r.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_toml_roundtrip() {
        for fixture in known_fixtures() {
            let toml = fixture.to_toml().unwrap();
            assert_eq!(Fixture::from_toml(&toml).unwrap(), fixture, "{}", toml);
        }
    }

    #[test]
    fn test_known_scenarios() {
        let simple = AnalysisConfig {
            structure_mode: StructureMode::Simple,
            ..AnalysisConfig::default()
        };

        let report = known("conjunction").analyze(simple.clone()).unwrap();
        assert_eq!(model_relations(&report), [vec!["A*B <-> C"]]);

        let report = known("constitution").analyze(simple.clone()).unwrap();
        assert_eq!(report.models.len(), 1);
        assert_eq!(report.classified.constitution, relations(&["A + B <-> X"]));

        let report = known("mutual-causation").analyze(simple.clone()).unwrap();
        assert_eq!(model_relations(&report), [vec!["B <-> A"], vec!["A <-> B"]]);

        let report = known("competing-causes").analyze(simple.clone()).unwrap();
        assert_eq!(model_relations(&report), [vec!["A <-> C"], vec!["B <-> C"]]);

        let report = known("ordered-mutual-causation").analyze(simple).unwrap();
        assert_eq!(model_relations(&report), [vec!["A <-> B"]]);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let first = ValueGenerator::from_seed("mlca").generate(arb_fixture("f", 3, 2));
        let second = ValueGenerator::from_seed("mlca").generate(arb_fixture("f", 3, 2));
        assert_eq!(first, second);
        assert_eq!(first.table.as_ref().map(DataTable::row_count), Some(8));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn proptest_random_structures_are_sound(fixture in arb_fixture("random", 3, 2)) {
            let table = fixture.table.clone().unwrap();
            for relation in &fixture.relations {
                prop_assert!(table.holds(relation), "{} generates the table", relation);
            }

            for strategy in [DerivationStrategy::TopDown, DerivationStrategy::BottomUp] {
                for structure_mode in [StructureMode::Simple, StructureMode::Complex] {
                    let config = AnalysisConfig {
                        strategy,
                        structure_mode,
                        max_resolutions: 500,
                        ..AnalysisConfig::default()
                    };
                    let report = match fixture.analyze(config) {
                        Ok(report) => report,
                        Err(ModelError::TooManyResolutions { .. })
                            if structure_mode == StructureMode::Complex => continue,
                        Err(error) => {
                            let message = format!("{:?}/{:?}: {}", strategy, structure_mode, error);
                            return Err(TestCaseError::fail(message));
                        }
                    };
                    for relation in &report.relations {
                        prop_assert!(table.holds(relation), "{:?}: {} holds", strategy, relation);
                    }
                    for model in &report.models {
                        prop_assert!(model.is_acyclic());
                    }
                    for (ix, model) in report.models.iter().enumerate() {
                        for other in &report.models[ix + 1..] {
                            prop_assert!(!contains_levels(other, model), "{:?}", model);
                            prop_assert!(!contains_levels(model, other), "{:?}", other);
                        }
                    }
                }
            }
        }
    }
}
