// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::node::{NodeId, SearchTree};
use crate::{
    factor::Factor,
    formula::{Conjunction, Dnf},
    table::{DataTable, Metrics},
};
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, trace};

/// The result of searching antecedents for one target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Formulas matching the target on every row.
    Found(Vec<Dnf>),
    /// No perfect formula was found; these exceed the quality threshold.
    BestEffort(Vec<Dnf>),
    /// Nothing qualified.
    Exhausted,
}

impl SearchOutcome {
    pub fn formulas(&self) -> &[Dnf] {
        match self {
            Self::Found(formulas) | Self::BestEffort(formulas) => formulas,
            Self::Exhausted => &[],
        }
    }

    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Bounds for a single search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchLimits {
    /// Node visits, shared by all relaxation passes.
    pub node_budget: usize,
    pub suspension_accuracy: f64,
    pub quality_threshold: f64,
    pub max_relaxations: usize,
    pub max_disjuncts: usize,
    pub max_conjuncts: usize,
}

/// A breadth-first search for antecedents of one target, pruning by suspension.
#[derive(Clone, Debug)]
pub struct SuspensionSearch<'a> {
    table: &'a DataTable,
    target: Factor,
    /// Factors for the first level of the tree, with their levels.
    candidates: Vec<(Factor, usize)>,
    active_causes: Option<BTreeSet<Factor>>,
    limits: SearchLimits,
}

impl<'a> SuspensionSearch<'a> {
    pub fn new(
        table: &'a DataTable,
        target: Factor,
        candidates: Vec<(Factor, usize)>,
        limits: SearchLimits,
    ) -> Self {
        Self {
            table,
            target,
            candidates,
            active_causes: None,
            limits,
        }
    }

    /// Suspends first-level nodes over factors outside `causes` until the first relaxation.
    pub fn with_active_causes(mut self, causes: impl IntoIterator<Item = Factor>) -> Self {
        self.active_causes = Some(causes.into_iter().collect());
        self
    }

    pub fn run(&self) -> SearchOutcome {
        let mut state = SearchState::new(self.metrics(&Dnf::default()));
        let mut suspension_accuracy = self.limits.suspension_accuracy;
        let mut relaxations = 0;

        loop {
            self.traverse(&mut state, suspension_accuracy);

            if !state.accepted.is_empty() {
                debug!(
                    effect = %self.target,
                    found = state.accepted.len(),
                    visits = state.visits,
                    "search succeeded"
                );
                return SearchOutcome::Found(state.formulas(&state.accepted));
            }
            if !state.good_enough.is_empty() {
                debug!(
                    effect = %self.target,
                    candidates = state.good_enough.len(),
                    visits = state.visits,
                    "search ended with best-effort results"
                );
                return SearchOutcome::BestEffort(state.formulas(&state.good_enough));
            }
            if !state.suspended.is_empty()
                && state.visits < self.limits.node_budget
                && relaxations < self.limits.max_relaxations
            {
                relaxations += 1;
                suspension_accuracy /= 2.0;
                debug!(
                    effect = %self.target,
                    relaxations,
                    suspension_accuracy,
                    visits = state.visits,
                    "lifting suspensions"
                );
                state.relax();
                continue;
            }

            debug!(effect = %self.target, visits = state.visits, "search exhausted");
            return SearchOutcome::Exhausted;
        }
    }

    fn traverse(&self, state: &mut SearchState, suspension_accuracy: f64) {
        let limits = &self.limits;
        let mut queue = VecDeque::from([NodeId::ROOT]);

        while let Some(id) = queue.pop_front() {
            state.visits += 1;
            if state.visits > limits.node_budget {
                break;
            }

            let node = state.tree.node(id);
            if id != NodeId::ROOT
                && (node.metrics.accuracy < suspension_accuracy
                    || (node.metrics.recall < limits.quality_threshold
                        && node.formula.len() == limits.max_disjuncts))
            {
                state.suspend(id);
                continue;
            }
            if node.suspended {
                continue;
            }
            if node.metrics.is_perfect() {
                if !state.accepted.contains(&id) {
                    state.accepted.push(id);
                }
                // Perfect nodes are neither extended nor used for extensions.
                state.suspend(id);
                continue;
            }
            if node.metrics.accuracy > limits.quality_threshold {
                state.good_enough.push(id);
            }

            if id == NodeId::ROOT {
                if state.active.is_empty() {
                    self.populate_first_level(state);
                }
            } else {
                self.expand(state, id);
            }

            let children = state.tree.node(id).children.clone();
            for child in children {
                let node = state.tree.node(child);
                if node.suspended || node.metrics.accuracy < suspension_accuracy {
                    state.suspend(child);
                } else {
                    let perfect = node.metrics.is_perfect();
                    if id == NodeId::ROOT && !state.active.contains(&child) {
                        state.active.push(child);
                    }
                    if perfect && !state.accepted.contains(&child) {
                        state.accepted.push(child);
                    }
                }
                queue.push_back(child);
            }
        }
    }

    fn populate_first_level(&self, state: &mut SearchState) {
        let mut literals: Vec<(Dnf, Metrics, usize, bool)> = self
            .candidates
            .iter()
            .filter(|(factor, _)| *factor != self.target)
            .flat_map(|(factor, level)| {
                let inactive = self
                    .active_causes
                    .as_ref()
                    .map_or(false, |causes| !causes.contains(factor));
                [factor.positive(), factor.negative()]
                    .into_iter()
                    .map(move |literal| (Dnf::literal(literal), *level, inactive))
            })
            .map(|(formula, level, inactive)| {
                let metrics = self.metrics(&formula);
                (formula, metrics, level, inactive)
            })
            .collect();
        literals.sort_by(|a, b| b.1.accuracy.total_cmp(&a.1.accuracy));

        for (formula, metrics, level, inactive) in literals {
            state
                .tree
                .add_child(NodeId::ROOT, formula, metrics, Some(level), inactive);
        }
    }

    /// Creates the children of `id` by combining it with the active nodes on its level.
    fn expand(&self, state: &mut SearchState, id: NodeId) {
        let limits = &self.limits;
        let node = state.tree.node(id).clone();
        if node.metrics.is_perfect() {
            return;
        }

        let mut extensions: Vec<(Dnf, NodeId)> = Vec::new();
        for &other_id in &state.active {
            let other = state.tree.node(other_id);
            if other.level != node.level || other.formula.len() != 1 {
                continue;
            }
            let conjunct = &other.formula.disjuncts()[0];

            if other.formula != node.formula && !other.metrics.is_perfect() {
                for (ix, disjunct) in node.formula.disjuncts().iter().enumerate() {
                    if disjunct.shares_factor(conjunct)
                        || disjunct.len() + conjunct.len() > limits.max_conjuncts
                    {
                        continue;
                    }
                    if let Some(extended) = disjunct.and(conjunct) {
                        let extended = node.formula.with_replaced_disjunct(ix, extended);
                        extensions.push((extended, other_id));
                    }
                }
            }

            if node.metrics.recall < 1.0
                && other.metrics.recall < 1.0
                && node.formula.len() < limits.max_disjuncts
                && !node.formula.contains_disjunct(conjunct)
            {
                extensions.push((node.formula.with_disjunct(conjunct.clone()), other_id));
            }
        }

        let mut extensions: Vec<(Dnf, Metrics, usize, NodeId)> = extensions
            .into_iter()
            .map(|(formula, other)| {
                let metrics = self.metrics(&formula);
                let rendered_len = formula.to_string().len();
                (formula, metrics, rendered_len, other)
            })
            .collect();
        // Most accurate first, shorter formulas first on ties.
        extensions.sort_by(|a, b| {
            b.1.accuracy
                .total_cmp(&a.1.accuracy)
                .then_with(|| a.2.cmp(&b.2))
        });

        for (formula, metrics, _, other) in extensions {
            if state.tree.is_created(&formula) {
                continue;
            }
            let other_metrics = state.tree.node(other).metrics;
            let assessment =
                assess(&state.tree, &formula, &metrics, &node.metrics, &other_metrics);
            let suspended = match assessment {
                Assessment::Keep => false,
                Assessment::Suspend => true,
                Assessment::Discard => {
                    trace!(
                        effect = %self.target,
                        formula = %formula,
                        "discarded non-minimal formula"
                    );
                    continue;
                }
            };
            state.tree.add_child(id, formula, metrics, node.level, suspended);
        }
    }

    fn metrics(&self, formula: &Dnf) -> Metrics {
        self.table
            .metrics(formula, &self.target)
            .unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Assessment {
    Keep,
    Suspend,
    Discard,
}

/// Decides what happens to a new child of a node with metrics `parent`, extended with a node with
/// metrics `other`.
fn assess(
    tree: &SearchTree,
    formula: &Dnf,
    metrics: &Metrics,
    parent: &Metrics,
    other: &Metrics,
) -> Assessment {
    let improves = (metrics.recall > parent.recall && metrics.recall > other.recall)
        || (metrics.specificity > parent.specificity && metrics.specificity > other.specificity);
    let more_accurate = metrics.accuracy > parent.accuracy || metrics.accuracy > other.accuracy;
    if !improves || !more_accurate {
        return Assessment::Suspend;
    }

    let perfect: Vec<&Dnf> = tree.perfect_nodes().map(|node| &node.formula).collect();

    // Every disjunct of an equally long perfect formula is implied by one of ours or repeated.
    let repeats_perfect = formula.len() > 1
        && formula.disjuncts().iter().any(|ours| {
            perfect.iter().any(|p| {
                p.len() == formula.len()
                    && p
                        .disjuncts()
                        .iter()
                        .all(|theirs| theirs.is_subset(ours) || formula.contains_disjunct(theirs))
            })
        });
    if repeats_perfect {
        return Assessment::Discard;
    }

    // Minimal necessity: no superfluous disjuncts on top of a perfect formula.
    if perfect.iter().any(|p| {
        formula.len() > p.len() && p.disjuncts().iter().all(|d| formula.contains_disjunct(d))
    }) {
        return Assessment::Discard;
    }

    let perfect_conjunctions: Vec<&Conjunction> =
        perfect.iter().filter_map(|p| p.as_conjunction()).collect();

    if formula.len() > 1
        && perfect_conjunctions
            .iter()
            .any(|x| splits_conjunction(formula, x))
    {
        return Assessment::Suspend;
    }

    // Minimal sufficiency: no disjunct strengthens a perfect conjunction.
    if formula
        .disjuncts()
        .iter()
        .any(|d| perfect_conjunctions.iter().any(|x| x.is_subset(d)))
    {
        return Assessment::Discard;
    }

    Assessment::Keep
}

/// Returns true if `formula` is `x*F + x*~F` for some factor `F`.
fn splits_conjunction(formula: &Dnf, x: &Conjunction) -> bool {
    formula.factors().iter().any(|factor| {
        let positive = x.and(&Conjunction::literal(factor.positive()));
        let negative = x.and(&Conjunction::literal(factor.negative()));
        match (positive, negative) {
            (Some(positive), Some(negative)) => *formula == Dnf::new([positive, negative]),
            _ => false,
        }
    })
}

struct SearchState {
    tree: SearchTree,
    /// Nodes available for extending others.
    active: Vec<NodeId>,
    suspended: BTreeSet<NodeId>,
    accepted: Vec<NodeId>,
    good_enough: Vec<NodeId>,
    visits: usize,
}

impl SearchState {
    fn new(root_metrics: Metrics) -> Self {
        Self {
            tree: SearchTree::new(root_metrics),
            active: Vec::new(),
            suspended: BTreeSet::new(),
            accepted: Vec::new(),
            good_enough: Vec::new(),
            visits: 0,
        }
    }

    fn suspend(&mut self, id: NodeId) {
        self.tree.node_mut(id).suspended = true;
        self.active.retain(|&active| active != id);
        self.suspended.insert(id);
    }

    /// Lifts every suspension and makes every node available for extensions. Created formulas
    /// stay created.
    fn relax(&mut self) {
        self.tree.lift_suspensions();
        self.suspended.clear();
        self.good_enough.clear();
        self.active = self.tree.descendants().collect();
    }

    fn formulas(&self, ids: &[NodeId]) -> Vec<Dnf> {
        ids.iter()
            .map(|&id| self.tree.node(id).formula.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_disjuncts: usize, max_conjuncts: usize) -> SearchLimits {
        SearchLimits {
            node_budget: 500,
            suspension_accuracy: 0.2,
            quality_threshold: 0.9,
            max_relaxations: 1,
            max_disjuncts,
            max_conjuncts,
        }
    }

    fn search<'a>(
        table: &'a DataTable,
        target: &str,
        limits: SearchLimits,
    ) -> SuspensionSearch<'a> {
        let candidates = table
            .factors()
            .iter()
            .filter(|f| f.name() != target)
            .map(|f| (f.clone(), 0))
            .collect();
        SuspensionSearch::new(table, Factor::new(target).unwrap(), candidates, limits)
    }

    fn rendered(outcome: &SearchOutcome) -> Vec<String> {
        outcome.formulas().iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_conjunction() {
        let table =
            DataTable::parse_rows(&["A", "B", "C"], &["111", "100", "010", "000"]).unwrap();
        let outcome = search(&table, "C", limits(1, 2)).run();
        assert!(outcome.is_found());
        assert_eq!(rendered(&outcome), ["A*B"]);
    }

    #[test]
    fn test_disjunction() {
        let table =
            DataTable::parse_rows(&["A", "B", "X"], &["111", "101", "011", "000"]).unwrap();
        let outcome = search(&table, "X", limits(3, 2)).run();
        assert_eq!(outcome, SearchOutcome::Found(vec!["A + B".parse().unwrap()]));
    }

    #[test]
    fn test_exhausted_and_best_effort() {
        // C takes both values while A = 1.
        let table = DataTable::parse_rows(&["A", "C"], &["11", "10"]).unwrap();
        assert_eq!(search(&table, "C", limits(1, 1)).run(), SearchOutcome::Exhausted);

        let mut lenient = limits(1, 1);
        lenient.quality_threshold = 0.4;
        let outcome = search(&table, "C", lenient).run();
        assert_eq!(outcome, SearchOutcome::BestEffort(vec!["A".parse().unwrap()]));
    }

    #[test]
    fn test_budget() {
        let table =
            DataTable::parse_rows(&["A", "B", "C"], &["111", "100", "010", "000"]).unwrap();
        let mut tight = limits(1, 2);
        tight.node_budget = 1;
        assert_eq!(search(&table, "C", tight).run(), SearchOutcome::Exhausted);
    }

    #[test]
    fn test_split_conjunction() {
        let x = Conjunction::new(["A".parse().unwrap()]).unwrap();
        assert!(splits_conjunction(&"A*B + A*~B".parse().unwrap(), &x));
        assert!(!splits_conjunction(&"A*B + ~A*~B".parse().unwrap(), &x));
    }
}
