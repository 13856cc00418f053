//! Graph assembly and descriptive statistics.
//!
//! Referential problems are never fatal: edges with missing endpoints and
//! self-loops are dropped and counted, duplicate node ids keep the first
//! record. Statistics describe the built graph; they gate nothing.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::{debug, info};

use rootmap_common::{domain_of, Edge, Node};

use crate::graph::GapGraph;

/// Assemble canonical nodes and edges into a validated directed graph.
pub fn build_graph(nodes: Vec<Node>, edges: Vec<Edge>) -> GapGraph {
    let input_edges = edges.len();

    let mut graph: DiGraph<Node, Edge> = DiGraph::new();
    let mut index: HashMap<String, NodeIndex> = HashMap::new();
    let mut duplicate_ids = 0usize;

    for mut node in nodes {
        node.normalize();
        if index.contains_key(&node.id) {
            debug!(id = %node.id, "Duplicate node id, keeping first");
            duplicate_ids += 1;
            continue;
        }
        let id = node.id.clone();
        let idx = graph.add_node(node);
        index.insert(id, idx);
    }

    let mut dropped_missing = 0usize;
    let mut dropped_self_loops = 0usize;
    for mut edge in edges {
        edge.normalize();
        let (Some(&source), Some(&target)) =
            (index.get(&edge.source_id), index.get(&edge.target_id))
        else {
            dropped_missing += 1;
            continue;
        };
        if edge.is_self_loop() {
            dropped_self_loops += 1;
            continue;
        }
        graph.add_edge(source, target, edge);
    }

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        input_edges,
        dropped_missing,
        dropped_self_loops,
        duplicate_ids,
        "Graph assembled"
    );

    GapGraph::from_parts(graph, index)
}

/// Summary statistics for a built graph.
#[derive(Debug, Default)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub orphan_nodes: usize,
    pub orphan_pct: f64,
    pub cross_field_edges: usize,
    pub node_types: HashMap<String, usize>,
    pub edge_types: HashMap<String, usize>,
    pub field_distribution: HashMap<String, usize>,
}

pub fn graph_stats(graph: &GapGraph) -> GraphStats {
    let inner = graph.inner();

    let mut node_types: HashMap<String, usize> = HashMap::new();
    let mut field_distribution: HashMap<String, usize> = HashMap::new();
    let mut orphans = 0usize;

    for idx in inner.node_indices() {
        let node = &inner[idx];
        *node_types.entry(node.node_type.to_string()).or_insert(0) += 1;
        for tag in &node.fields {
            *field_distribution
                .entry(domain_of(tag).to_string())
                .or_insert(0) += 1;
        }
        let degree = inner.edges_directed(idx, Direction::Outgoing).count()
            + inner.edges_directed(idx, Direction::Incoming).count();
        if degree == 0 {
            orphans += 1;
        }
    }

    let mut edge_types: HashMap<String, usize> = HashMap::new();
    let mut cross_field_edges = 0usize;
    for edge_ref in inner.edge_references() {
        let edge = edge_ref.weight();
        *edge_types.entry(edge.edge_type.to_string()).or_insert(0) += 1;

        let source_domains: HashSet<&str> = inner[edge_ref.source()]
            .fields
            .iter()
            .map(|t| domain_of(t))
            .collect();
        let target_domains: HashSet<&str> = inner[edge_ref.target()]
            .fields
            .iter()
            .map(|t| domain_of(t))
            .collect();
        if !source_domains.is_empty()
            && !target_domains.is_empty()
            && source_domains.is_disjoint(&target_domains)
        {
            cross_field_edges += 1;
        }
    }

    let nodes = inner.node_count();
    GraphStats {
        nodes,
        edges: inner.edge_count(),
        orphan_nodes: orphans,
        orphan_pct: (orphans as f64 / nodes.max(1) as f64 * 1000.0).round() / 10.0,
        cross_field_edges,
        node_types,
        edge_types,
        field_distribution,
    }
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Graph Stats ===")?;
        writeln!(f, "Nodes:             {}", self.nodes)?;
        writeln!(f, "Edges:             {}", self.edges)?;
        writeln!(
            f,
            "Orphans:           {} ({}%)",
            self.orphan_nodes, self.orphan_pct
        )?;
        writeln!(f, "Cross-field edges: {}", self.cross_field_edges)?;
        writeln!(f, "Node types:        {}", sorted_counts(&self.node_types))?;
        writeln!(f, "Edge types:        {}", sorted_counts(&self.edge_types))?;
        writeln!(
            f,
            "Domains:           {}",
            sorted_counts(&self.field_distribution)
        )?;
        Ok(())
    }
}

/// Render a histogram as "key: count" pairs, most frequent first.
fn sorted_counts(counts: &HashMap<String, usize>) -> String {
    let mut entries: Vec<(&str, usize)> = counts.iter().map(|(k, &v)| (k.as_str(), v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    entries
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{enables_edge, gap_node};

    #[test]
    fn edges_with_missing_endpoints_are_dropped() {
        let nodes = vec![gap_node("a", "A", &["x.1"]), gap_node("b", "B", &["x.1"])];
        let edges = vec![
            enables_edge("e1", "a", "b", 1.0, 1.0),
            enables_edge("e2", "a", "ghost", 1.0, 1.0),
            enables_edge("e3", "ghost", "b", 1.0, 1.0),
        ];
        let graph = build_graph(nodes, edges);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn self_loops_are_dropped() {
        let nodes = vec![gap_node("a", "A", &["x.1"])];
        let edges = vec![enables_edge("e1", "a", "a", 1.0, 1.0)];
        let graph = build_graph(nodes, edges);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn duplicate_node_ids_keep_first() {
        let mut second = gap_node("a", "Second", &["y.1"]);
        second.confidence = 0.9;
        let nodes = vec![gap_node("a", "First", &["x.1"]), second];
        let graph = build_graph(nodes, vec![]);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node("a").unwrap().title, "First");
    }

    #[test]
    fn records_are_normalized_during_build() {
        let mut node = gap_node("a", "A", &["x.1"]);
        node.title = "t".repeat(300);
        node.confidence = 2.0;
        let graph = build_graph(vec![node], vec![]);
        let built = graph.node("a").unwrap();
        assert_eq!(built.title.chars().count(), 200);
        assert_eq!(built.confidence, 1.0);
    }

    #[test]
    fn stats_count_orphans_and_cross_field_edges() {
        let nodes = vec![
            gap_node("a", "A", &["x.1"]),
            gap_node("b", "B", &["y.1"]),
            gap_node("lonely", "L", &["z.1"]),
        ];
        let edges = vec![enables_edge("e1", "a", "b", 1.0, 1.0)];
        let graph = build_graph(nodes, edges);
        let stats = graph_stats(&graph);

        assert_eq!(stats.nodes, 3);
        assert_eq!(stats.edges, 1);
        assert_eq!(stats.orphan_nodes, 1);
        assert!((stats.orphan_pct - 33.3).abs() < 1e-9);
        assert_eq!(stats.cross_field_edges, 1);
        assert_eq!(stats.edge_types.get("ENABLES"), Some(&1));
        assert_eq!(stats.field_distribution.get("x"), Some(&1));
    }

    #[test]
    fn same_domain_edge_is_not_cross_field() {
        let nodes = vec![
            gap_node("a", "A", &["x.1", "y.2"]),
            gap_node("b", "B", &["y.3"]),
        ];
        let edges = vec![enables_edge("e1", "a", "b", 1.0, 1.0)];
        let stats = graph_stats(&build_graph(nodes, edges));
        assert_eq!(stats.cross_field_edges, 0);
    }
}
