//! In-process analysis pipeline: dedup → build → rank.
//!
//! This is the core's orchestration seam, not a CLI; callers hand it
//! candidate records and the two collaborators and get a ranked report back.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use rootmap_common::{Config, Edge, Node};

use crate::arbiter::ClusterArbiter;
use crate::builder::{build_graph, graph_stats, GraphStats};
use crate::cascade::CascadeScorer;
use crate::dedup::{Deduper, DedupStats};
use crate::embedder::TextEmbedder;
use crate::graph::GapGraph;
use crate::leverage::{LeverageRanker, LeverageRanking, LeverageWeights};
use crate::similarity::DEFAULT_SIMILARITY_THRESHOLD;

/// Tunables for one analysis run. Defaults match the documented algorithm
/// parameters.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    pub dedup_threshold: f64,
    pub weights: LeverageWeights,
    pub cascade: CascadeScorer,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            dedup_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            weights: LeverageWeights::default(),
            cascade: CascadeScorer::default(),
        }
    }
}

impl AnalysisOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            dedup_threshold: config.dedup_threshold,
            ..Self::default()
        }
    }
}

/// Everything one run produces.
pub struct AnalysisReport {
    pub graph: GapGraph,
    pub stats: GraphStats,
    pub dedup: DedupStats,
    pub ranking: LeverageRanking,
}

pub struct GraphPipeline {
    embedder: Arc<dyn TextEmbedder>,
    arbiter: Option<Arc<dyn ClusterArbiter>>,
    options: AnalysisOptions,
}

impl GraphPipeline {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self {
            embedder,
            arbiter: None,
            options: AnalysisOptions::default(),
        }
    }

    pub fn with_arbiter(mut self, arbiter: Arc<dyn ClusterArbiter>) -> Self {
        self.arbiter = Some(arbiter);
        self
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the full pass over candidate records.
    pub async fn run(&self, nodes: Vec<Node>, edges: Vec<Edge>) -> Result<AnalysisReport> {
        info!(
            nodes = nodes.len(),
            edges = edges.len(),
            threshold = self.options.dedup_threshold,
            "Starting analysis run"
        );

        let mut deduper =
            Deduper::new(self.embedder.clone()).with_threshold(self.options.dedup_threshold);
        if let Some(arbiter) = &self.arbiter {
            deduper = deduper.with_arbiter(arbiter.clone());
        }
        let (canonical, dedup) = deduper.dedup(nodes).await?;

        let graph = build_graph(canonical, edges);
        let stats = graph_stats(&graph);

        let ranking = LeverageRanker::new(self.options.weights)
            .with_cascade(self.options.cascade)
            .rank(&graph);

        Ok(AnalysisReport {
            graph,
            stats,
            dedup,
            ranking,
        })
    }
}
