//! Entity resolution for candidate nodes: embed, cluster, resolve.
//!
//! Fast merge collapses each cluster without consulting anyone; the
//! arbitrated path asks a [`ClusterArbiter`] and falls back to keeping the
//! cluster distinct on any failure, so ambiguous clusters are never
//! silently collapsed.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use rootmap_common::Node;

use crate::arbiter::{ArbitrationOutcome, ClusterArbiter};
use crate::embedder::TextEmbedder;
use crate::similarity::{find_duplicate_clusters, SimilarityMatrix, DEFAULT_SIMILARITY_THRESHOLD};

/// Dedup pipeline: embed → cluster → merge/resolve.
pub struct Deduper {
    embedder: Arc<dyn TextEmbedder>,
    arbiter: Option<Arc<dyn ClusterArbiter>>,
    threshold: f64,
}

impl Deduper {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self {
            embedder,
            arbiter: None,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Enable arbitration. Without an arbiter every cluster is fast-merged.
    pub fn with_arbiter(mut self, arbiter: Arc<dyn ClusterArbiter>) -> Self {
        self.arbiter = Some(arbiter);
        self
    }

    /// Resolve duplicates. Non-clustered nodes pass through unchanged, in
    /// input order, followed by resolved cluster outputs.
    pub async fn dedup(&self, nodes: Vec<Node>) -> Result<(Vec<Node>, DedupStats)> {
        let mut stats = DedupStats {
            input_nodes: nodes.len(),
            output_nodes: nodes.len(),
            ..DedupStats::default()
        };

        if nodes.len() < 2 {
            return Ok((nodes, stats));
        }

        let texts: Vec<String> = nodes.iter().map(Node::embedding_text).collect();
        let embeddings = self.embedder.embed_batch(texts).await?;
        let matrix = SimilarityMatrix::compute(&embeddings);
        let clusters = find_duplicate_clusters(&matrix, self.threshold);
        stats.clusters = clusters.len();

        if clusters.is_empty() {
            info!(nodes = nodes.len(), "No duplicates found");
            return Ok((nodes, stats));
        }

        let clustered: HashSet<usize> = clusters.iter().flatten().copied().collect();
        let mut result: Vec<Node> = nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| !clustered.contains(i))
            .map(|(_, n)| n.clone())
            .collect();

        for cluster in &clusters {
            let members: Vec<Node> = cluster.iter().map(|&i| nodes[i].clone()).collect();
            let resolved = self.resolve_cluster(members, &mut stats).await;
            result.extend(resolved);
        }

        stats.output_nodes = result.len();
        info!(
            input = stats.input_nodes,
            output = stats.output_nodes,
            clusters = stats.clusters,
            merged = stats.merged,
            "Dedup complete"
        );
        Ok((result, stats))
    }

    async fn resolve_cluster(&self, members: Vec<Node>, stats: &mut DedupStats) -> Vec<Node> {
        let Some(arbiter) = &self.arbiter else {
            stats.merged += 1;
            return vec![fast_merge(&members)];
        };

        let outcome = match arbiter.arbitrate(&members).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, cluster_size = members.len(), "Arbitration failed, keeping cluster distinct");
                ArbitrationOutcome::Distinct
            }
        };

        match outcome {
            ArbitrationOutcome::Merge { title, description } => {
                stats.merged += 1;
                let mut merged = fast_merge(&members);
                if let Some(title) = title {
                    merged.title = title;
                }
                if let Some(description) = description {
                    merged.description = description;
                }
                merged.normalize();
                vec![merged]
            }
            ArbitrationOutcome::Hierarchy => {
                stats.hierarchies += 1;
                link_hierarchy(members)
            }
            ArbitrationOutcome::Distinct => {
                stats.distinct += 1;
                members
            }
        }
    }
}

/// Collapse a cluster without an oracle: the highest-confidence member is
/// the base (earliest wins ties), provenance is unioned by source id, and
/// merged confidence is the max over the cluster.
pub fn fast_merge(members: &[Node]) -> Node {
    let base = members
        .iter()
        .fold(&members[0], |best, n| {
            if n.confidence > best.confidence {
                n
            } else {
                best
            }
        });
    let base_id = base.id.clone();
    let mut merged = base.clone();

    let mut seen: HashSet<String> = merged
        .sources
        .iter()
        .map(|s| s.source_id.clone())
        .collect();
    for node in members {
        if node.id == base_id {
            continue;
        }
        for source in &node.sources {
            if seen.insert(source.source_id.clone()) {
                merged.sources.push(source.clone());
            }
        }
    }

    merged.confidence = members
        .iter()
        .map(|n| n.confidence)
        .fold(f64::NEG_INFINITY, f64::max);
    merged
}

/// Keep all members, recording the first as parent of the rest.
fn link_hierarchy(members: Vec<Node>) -> Vec<Node> {
    let mut iter = members.into_iter();
    let Some(mut parent) = iter.next() else {
        return Vec::new();
    };

    let mut children: Vec<Node> = Vec::new();
    for mut child in iter {
        child.parent_id = Some(parent.id.clone());
        if !parent.children_ids.contains(&child.id) {
            parent.children_ids.push(child.id.clone());
        }
        children.push(child);
    }

    let mut out = vec![parent];
    out.extend(children);
    out
}

#[derive(Debug, Default)]
pub struct DedupStats {
    pub input_nodes: usize,
    pub clusters: usize,
    pub merged: usize,
    pub hierarchies: usize,
    pub distinct: usize,
    pub output_nodes: usize,
}

impl std::fmt::Display for DedupStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Dedup Complete ===")?;
        writeln!(f, "Input nodes:  {}", self.input_nodes)?;
        writeln!(f, "Clusters:     {}", self.clusters)?;
        writeln!(f, "Merged:       {}", self.merged)?;
        writeln!(f, "Hierarchies:  {}", self.hierarchies)?;
        writeln!(f, "Distinct:     {}", self.distinct)?;
        writeln!(f, "Output nodes: {}", self.output_nodes)?;
        Ok(())
    }
}
