// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{formula::Dnf, table::Metrics};
use std::collections::HashSet;

/// Index of a node in a [`SearchTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

/// A candidate antecedent in the search tree.
#[derive(Clone, Debug)]
pub struct Node {
    pub formula: Dnf,
    pub metrics: Metrics,
    /// The level of the factors the formula is built from; `None` for the root.
    pub level: Option<usize>,
    pub children: Vec<NodeId>,
    /// Suspended nodes are neither expanded nor used to expand others.
    pub suspended: bool,
}

/// An arena of search nodes rooted at the empty formula.
///
/// Every formula is created at most once over the lifetime of the tree.
#[derive(Clone, Debug)]
pub struct SearchTree {
    nodes: Vec<Node>,
    created: HashSet<Dnf>,
    perfect: Vec<NodeId>,
}

impl SearchTree {
    pub fn new(root_metrics: Metrics) -> Self {
        let root = Node {
            formula: Dnf::default(),
            metrics: root_metrics,
            level: None,
            children: Vec::new(),
            suspended: false,
        };
        Self {
            nodes: vec![root],
            created: HashSet::new(),
            perfect: Vec::new(),
        }
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// The number of nodes, including the root.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_created(&self, formula: &Dnf) -> bool {
        self.created.contains(formula)
    }

    /// Nodes created so far whose formula matches the target on every row.
    #[inline]
    pub fn perfect_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.perfect.iter().map(move |&id| self.node(id))
    }

    /// All nodes except the root.
    pub fn descendants(&self) -> impl Iterator<Item = NodeId> {
        (1..self.nodes.len()).map(NodeId)
    }

    /// Adds a child below `parent`. Returns `None` if the formula was already created.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        formula: Dnf,
        metrics: Metrics,
        level: Option<usize>,
        suspended: bool,
    ) -> Option<NodeId> {
        if !self.created.insert(formula.clone()) {
            return None;
        }
        let id = NodeId(self.nodes.len());
        if metrics.is_perfect() {
            self.perfect.push(id);
        }
        self.nodes.push(Node {
            formula,
            metrics,
            level,
            children: Vec::new(),
            suspended,
        });
        self.nodes[parent.0].children.push(id);
        Some(id)
    }

    pub fn lift_suspensions(&mut self) {
        for node in &mut self.nodes {
            node.suspended = false;
        }
    }
}
