//! In-memory gap graph and the restricted scoring view.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use rootmap_common::{Edge, EdgeType, Node};

/// Validated directed graph of gap nodes and dependency edges.
///
/// Immutable once built; all three scorers run against views of the same
/// instance. Node enumeration order is insertion order, which downstream
/// ranking uses as the stable tie-break.
pub struct GapGraph {
    graph: DiGraph<Node, Edge>,
    index: HashMap<String, NodeIndex>,
}

impl GapGraph {
    pub(crate) fn from_parts(graph: DiGraph<Node, Edge>, index: HashMap<String, NodeIndex>) -> Self {
        Self { graph, index }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_weights()
    }

    pub(crate) fn inner(&self) -> &DiGraph<Node, Edge> {
        &self.graph
    }

    /// Build the restricted adjacency shared by the scorers.
    pub fn enables_view(&self) -> EnablesView {
        EnablesView::build(self)
    }
}

/// Read-only adjacency over the ENABLES/PRODUCES_FOR subgraph.
///
/// Built once per scoring pass. Positions are graph insertion order; each
/// outgoing entry carries the combined strength×confidence edge weight.
pub struct EnablesView {
    ids: Vec<String>,
    domains: Vec<Vec<String>>,
    out: Vec<Vec<(usize, f64)>>,
    edge_count: usize,
}

impl EnablesView {
    fn build(graph: &GapGraph) -> Self {
        let inner = graph.inner();
        let n = inner.node_count();

        let mut ids = Vec::with_capacity(n);
        let mut domains = Vec::with_capacity(n);
        for node in inner.node_weights() {
            ids.push(node.id.clone());
            domains.push(node.domains().iter().map(|d| d.to_string()).collect());
        }

        let mut out: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut edge_count = 0usize;
        for edge_ref in inner.edge_references() {
            let edge = edge_ref.weight();
            if !matches!(edge.edge_type, EdgeType::Enables | EdgeType::ProducesFor) {
                continue;
            }
            out[edge_ref.source().index()].push((edge_ref.target().index(), edge.weight()));
            edge_count += 1;
        }

        Self {
            ids,
            domains,
            out,
            edge_count,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn node_id(&self, position: usize) -> &str {
        &self.ids[position]
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Top-level domains of the node at `position`.
    pub fn domains(&self, position: usize) -> &[String] {
        &self.domains[position]
    }

    /// Outgoing `(target position, strength×confidence)` pairs.
    pub fn out(&self, position: usize) -> &[(usize, f64)] {
        &self.out[position]
    }
}
